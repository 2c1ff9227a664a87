//! HTTP document loading and passage splitting.
//!
//! Registry documents are HTML renderings of the technical sheet or
//! leaflet. The loader fetches one, strips markup, and windows the text
//! into overlapping passages sized for embedding.

use super::{DocumentLoader, Passage, RetrievalError, RetrievalResult};

/// Blocking HTTP loader with size/overlap passage splitting.
pub struct HttpDocumentLoader {
    client: reqwest::blocking::Client,
    max_passage_chars: usize,
    overlap_chars: usize,
}

impl HttpDocumentLoader {
    pub fn new(timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            max_passage_chars: 1000,
            overlap_chars: 100,
        }
    }

    pub fn with_passage_size(mut self, max_passage_chars: usize, overlap_chars: usize) -> Self {
        self.max_passage_chars = max_passage_chars;
        self.overlap_chars = overlap_chars;
        self
    }
}

impl Default for HttpDocumentLoader {
    fn default() -> Self {
        Self::new(60)
    }
}

impl DocumentLoader for HttpDocumentLoader {
    fn load_and_split(&self, url: &str) -> RetrievalResult<Vec<Passage>> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| RetrievalError::Fetch {
                url: url.to_string(),
                cause: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Fetch {
                url: url.to_string(),
                cause: format!("HTTP {status}"),
            });
        }

        let body = response.text().map_err(|e| RetrievalError::Fetch {
            url: url.to_string(),
            cause: e.to_string(),
        })?;

        let text = strip_html(&body);
        let passages = split_into_passages(&text, url, self.max_passage_chars, self.overlap_chars);
        if passages.is_empty() {
            return Err(RetrievalError::EmptyDocument(url.to_string()));
        }
        tracing::debug!(url, passages = passages.len(), "document loaded and split");
        Ok(passages)
    }
}

/// Strip HTML markup, dropping script/style content and decoding the
/// handful of entities these documents actually use.
pub fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len() / 2);
    let mut in_tag = false;
    let mut tag = String::new();
    let mut skipping: Option<&'static str> = None;

    for c in html.chars() {
        match (in_tag, c) {
            (false, '<') => {
                in_tag = true;
                tag.clear();
            }
            (false, _) => {
                if skipping.is_none() {
                    out.push(c);
                }
            }
            (true, '>') => {
                in_tag = false;
                let closing = tag.starts_with('/');
                let name = tag
                    .trim_start_matches('/')
                    .split(|c: char| c.is_whitespace() || c == '/')
                    .next()
                    .unwrap_or("")
                    .to_lowercase();
                match (skipping, closing, name.as_str()) {
                    (None, false, "script") => skipping = Some("script"),
                    (None, false, "style") => skipping = Some("style"),
                    (Some(open), true, name) if name == open => skipping = None,
                    _ => {}
                }
                // Tag boundaries separate words
                if skipping.is_none() {
                    out.push(' ');
                }
            }
            (true, _) => tag.push(c),
        }
    }

    out.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
}

/// Window plain text into passages of at most `max_chars`, overlapping by
/// roughly `overlap_chars`, breaking at word boundaries.
pub fn split_into_passages(
    text: &str,
    source_url: &str,
    max_chars: usize,
    overlap_chars: usize,
) -> Vec<Passage> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut passages = Vec::new();
    let mut start = 0;
    let mut index = 0;

    while start < words.len() {
        let mut end = start;
        let mut length = 0;
        while end < words.len() && length + words[end].len() + 1 <= max_chars {
            length += words[end].len() + 1;
            end += 1;
        }
        if end == start {
            // Single word longer than the window; emit it whole
            end = start + 1;
        }

        passages.push(Passage {
            source_url: source_url.to_string(),
            content: words[start..end].join(" "),
            index,
        });
        index += 1;

        if end >= words.len() {
            break;
        }

        // Step back enough words to cover the overlap
        let mut back = 0;
        let mut back_length = 0;
        while back < end - start - 1 && back_length < overlap_chars {
            back += 1;
            back_length += words[end - back].len() + 1;
        }
        start = end - back;
    }

    passages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_removes_tags() {
        let html = "<html><body><p>Reacciones <b>adversas</b> frecuentes</p></body></html>";
        let text = strip_html(html);
        assert!(text.contains("Reacciones"));
        assert!(text.contains("adversas"));
        assert!(!text.contains('<'));
    }

    #[test]
    fn test_strip_html_drops_script_and_style() {
        let html = "<p>visible</p><script>var x = 1;</script><style>p{color:red}</style><p>also visible</p>";
        let text = strip_html(html);
        assert!(text.contains("visible"));
        assert!(text.contains("also visible"));
        assert!(!text.contains("var x"));
        assert!(!text.contains("color:red"));
    }

    #[test]
    fn test_strip_html_decodes_entities() {
        assert!(strip_html("uno&nbsp;dos &amp; tres").contains("uno dos & tres"));
    }

    #[test]
    fn test_split_respects_max_chars() {
        let text = "palabra ".repeat(500);
        let passages = split_into_passages(&text, "u", 100, 20);
        assert!(passages.len() > 1);
        assert!(passages.iter().all(|p| p.content.len() <= 100));
    }

    #[test]
    fn test_split_overlaps_consecutive_passages() {
        let text = (0..100).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let passages = split_into_passages(&text, "u", 80, 20);
        assert!(passages.len() > 1);

        let first_words: Vec<&str> = passages[0].content.split_whitespace().collect();
        let second_words: Vec<&str> = passages[1].content.split_whitespace().collect();
        // The tail of one window reappears at the head of the next
        assert!(second_words.contains(first_words.last().unwrap()));
    }

    #[test]
    fn test_split_empty_text_yields_nothing() {
        assert!(split_into_passages("", "u", 100, 20).is_empty());
        assert!(split_into_passages("   \n  ", "u", 100, 20).is_empty());
    }

    #[test]
    fn test_split_indexes_passages_in_order() {
        let text = "uno dos tres cuatro cinco seis siete ocho";
        let passages = split_into_passages(text, "u", 15, 4);
        let indexes: Vec<usize> = passages.iter().map(|p| p.index).collect();
        assert_eq!(indexes, (0..passages.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_oversized_word_is_emitted_whole() {
        let text = "supercalifragilisticoespialidoso";
        let passages = split_into_passages(text, "u", 10, 2);
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].content, text);
    }
}
