//! Query parameter schemas for the two registry endpoints.
//!
//! Both schemas are slot-filled from the user's message by the language
//! model. Only populated fields exist on the wire: absent fields are never
//! serialized or sent, because a defaulted value would over-constrain the
//! remote query.

use serde::{Deserialize, Serialize};

use searchmed_llm::{FieldSpec, SlotSchema};

/// Parameters for the single-record lookup endpoint.
///
/// Either identifier uniquely determines a medication; the user usually
/// supplies one of the two.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MedicamentoQuery {
    /// Código nacional
    pub cn: Option<String>,
    /// Nº de registro
    pub nregistro: Option<String>,
}

impl MedicamentoQuery {
    /// True when no identifier was extracted.
    pub fn is_empty(&self) -> bool {
        self.cn.is_none() && self.nregistro.is_none()
    }

    /// Sparse outgoing query pairs — populated fields only.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(cn) = &self.cn {
            pairs.push(("cn", cn.clone()));
        }
        if let Some(nregistro) = &self.nregistro {
            pairs.push(("nregistro", nregistro.clone()));
        }
        pairs
    }
}

impl SlotSchema for MedicamentoQuery {
    fn schema_name() -> &'static str {
        "búsqueda de medicamento por código o registro"
    }

    fn fields() -> &'static [FieldSpec] {
        &[
            FieldSpec {
                name: "cn",
                description: "Código nacional",
            },
            FieldSpec {
                name: "nregistro",
                description: "Nº de registro",
            },
        ]
    }
}

/// Parameters for the multi-record search endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MedicamentosQuery {
    /// Commercial name filter
    pub nombre: Option<String>,
    /// Laboratory filter
    pub laboratorio: Option<String>,
    /// Active-ingredient filter
    pub practiv1: Option<String>,
}

impl MedicamentosQuery {
    /// True when no filter was extracted. An empty filter set would be an
    /// unrestricted registry scan; the dispatcher rejects it.
    pub fn is_empty(&self) -> bool {
        self.nombre.is_none() && self.laboratorio.is_none() && self.practiv1.is_none()
    }

    /// Sparse outgoing query pairs — populated fields only.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(nombre) = &self.nombre {
            pairs.push(("nombre", nombre.clone()));
        }
        if let Some(laboratorio) = &self.laboratorio {
            pairs.push(("laboratorio", laboratorio.clone()));
        }
        if let Some(practiv1) = &self.practiv1 {
            pairs.push(("practiv1", practiv1.clone()));
        }
        pairs
    }
}

impl SlotSchema for MedicamentosQuery {
    fn schema_name() -> &'static str {
        "búsqueda de medicamentos por descripción o características"
    }

    fn fields() -> &'static [FieldSpec] {
        &[
            FieldSpec {
                name: "nombre",
                description: "Nombre comercial del medicamento (sin información adicional)",
            },
            FieldSpec {
                name: "laboratorio",
                description: "Nombre del laboratorio",
            },
            FieldSpec {
                name: "practiv1",
                description: "Nombre del principio activo",
            },
        ]
    }
}
