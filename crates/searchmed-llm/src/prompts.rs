//! Prompt builders for the SearchMed assistant.
//!
//! Two prompts are used: a slot-filling extraction prompt that carries the
//! schema's format instructions, and a retrieval-grounded QA prompt. Both
//! are in Spanish, the language of the registry and its users.

/// Build the slot-filling extraction prompt.
///
/// `format_instructions` describes the schema to fill (see
/// [`crate::extraction::SlotSchema::format_instructions`]); the model is
/// told to populate only what the user's message evidences.
pub fn make_extraction_prompt(format_instructions: &str, user_message: &str) -> String {
    format!(
        "Eres un asistente virtual especializado en la búsqueda de información de \
         medicamentos para el servicio SearchMed. Tu objetivo es extraer información \
         relevante de la conversación actual del usuario de manera precisa y concisa. \
         Debes completar el esquema con base en la información proporcionada en el \
         mensaje del usuario, sin agregar detalles adicionales o inventar datos que \
         no estén explícitamente mencionados.\
         \n\n{format_instructions}\
         \n\nMENSAJE DEL USUARIO: {user_message}\
         \n\nCONTEXTUALIZACIÓN: Usa solo la información proporcionada para completar \
         el esquema. No utilices datos externos ni supongas detalles no mencionados \
         explícitamente por el usuario."
    )
}

/// Build the grounded question-answering prompt.
///
/// `context` is the concatenation of the retrieved passages. The model must
/// decline rather than fabricate when the context does not cover the answer.
pub fn make_qa_prompt(question: &str, context: &str) -> String {
    format!(
        "Eres un asistente para tareas de respuesta a preguntas. \
         Utiliza los siguientes fragmentos de contexto obtenidos para responder a la pregunta. \
         Si no conoces la respuesta, simplemente di que no lo sabes. \
         Utiliza un máximo de tres oraciones y mantén la respuesta concisa. Responde en español.\
         \n\nPregunta: {question}\
         \n\nContexto: {context}\
         \n\nRespuesta:"
    )
}
