use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CtxError, Result};
use crate::model::EmbeddingModel;
use crate::numeric::{is_numeric_looking, numeric_placeholder};

const MAX_DIMENSION: usize = 1 << 16;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VectorFormat {
    #[default]
    Text,
    Binary,
}

#[derive(Debug, Clone)]
pub struct WordTable {
    vectors: HashMap<String, Vec<f32>>,
    dimension: usize,
}

impl WordTable {
    pub fn new(dimension: usize) -> Self {
        Self {
            vectors: HashMap::new(),
            dimension,
        }
    }

    pub fn from_entries<I>(dimension: usize, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Vec<f32>)>,
    {
        let mut table = Self::new(dimension);
        for (word, vector) in entries {
            table.insert(word, vector)?;
        }
        Ok(table)
    }

    pub fn insert(&mut self, word: String, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(CtxError::DimensionMismatch {
                expected: self.dimension,
                found: vector.len(),
            });
        }
        self.vectors.insert(word, vector);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.vectors.contains_key(word)
    }

    pub fn load(path: &Path, format: VectorFormat, limit: Option<usize>) -> Result<Self> {
        let table = match format {
            VectorFormat::Text => Self::load_text(path, limit)?,
            VectorFormat::Binary => Self::load_binary(path, limit)?,
        };
        tracing::info!(
            "loaded {} word vectors ({}d) from {}",
            table.len(),
            table.dimension,
            path.display()
        );
        Ok(table)
    }

    /// word2vec / GloVe text format. The `<count> <dim>` header is optional;
    /// without it the first entry fixes the dimensionality.
    pub fn load_text(path: &Path, limit: Option<usize>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut table: Option<WordTable> = None;
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }
            if line_no == 0 && parts.len() == 2 && parts.iter().all(|p| p.parse::<usize>().is_ok())
            {
                let dimension = parts[1].parse::<usize>().unwrap_or_default();
                table = Some(WordTable::new(dimension));
                continue;
            }
            if limit.is_some_and(|max| table.as_ref().map_or(0, |t| t.len()) >= max) {
                break;
            }
            let values = parts[1..]
                .iter()
                .map(|raw| raw.parse::<f32>())
                .collect::<std::result::Result<Vec<f32>, _>>();
            let values = match values {
                Ok(values) => values,
                Err(err) => {
                    tracing::warn!("skipping line {} of {}: {err}", line_no + 1, path.display());
                    continue;
                }
            };
            let table = table.get_or_insert_with(|| WordTable::new(values.len()));
            if values.len() != table.dimension {
                tracing::warn!(
                    "skipping line {} of {}: expected {} values, found {}",
                    line_no + 1,
                    path.display(),
                    table.dimension,
                    values.len()
                );
                continue;
            }
            table.vectors.insert(parts[0].to_string(), values);
        }
        table.ok_or_else(|| CtxError::VectorFormat {
            path: path.to_path_buf(),
            reason: "no vectors found".to_string(),
        })
    }

    /// word2vec binary format: `<count> <dim>\n`, then per entry the word, a
    /// single space and `dim` little-endian f32 values.
    pub fn load_binary(path: &Path, limit: Option<usize>) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut header = String::new();
        reader.read_line(&mut header)?;
        let malformed = |reason: String| CtxError::VectorFormat {
            path: path.to_path_buf(),
            reason,
        };
        let mut fields = header.split_whitespace().map(|f| f.parse::<usize>());
        let (count, dimension) = match (fields.next(), fields.next()) {
            (Some(Ok(count)), Some(Ok(dimension))) => (count, dimension),
            _ => return Err(malformed(format!("invalid header {:?}", header.trim()))),
        };
        if dimension == 0 || dimension > MAX_DIMENSION {
            return Err(malformed(format!("unsupported dimension {dimension}")));
        }
        let width = dimension
            .checked_mul(4)
            .ok_or_else(|| malformed(format!("unsupported dimension {dimension}")))?;
        let wanted = limit.map_or(count, |max| max.min(count));
        let mut table = WordTable::new(dimension);
        let mut buf = vec![0u8; width];
        for idx in 0..wanted {
            let word = read_word(&mut reader)?;
            if word.is_empty() {
                return Err(malformed(format!("truncated at entry {idx}")));
            }
            reader.read_exact(&mut buf)?;
            let vector = buf
                .chunks_exact(4)
                .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                .collect();
            table.vectors.insert(word, vector);
        }
        Ok(table)
    }

    fn lookup(&self, word: &str) -> Option<Vec<f32>> {
        self.vectors.get(word).cloned()
    }
}

fn read_word<R: BufRead>(reader: &mut R) -> Result<String> {
    let mut bytes = Vec::new();
    reader.read_until(b' ', &mut bytes)?;
    if bytes.last() == Some(&b' ') {
        bytes.pop();
    }
    let start = bytes.iter().position(|b| *b != b'\n').unwrap_or(bytes.len());
    Ok(String::from_utf8_lossy(&bytes[start..]).into_owned())
}

impl EmbeddingModel for WordTable {
    fn dimension(&self) -> usize {
        self.dimension
    }

    /// Exact lookup, then a single retry with a `#` placeholder of the same
    /// width for numeric-looking words.
    fn vectorize_word(&self, word: &str) -> Option<Vec<f32>> {
        if let Some(vector) = self.lookup(word) {
            return Some(vector);
        }
        if is_numeric_looking(word) {
            return self.lookup(&numeric_placeholder(word));
        }
        None
    }

    fn vectorize_words(&self, words: &[String]) -> Vec<Vec<f32>> {
        words
            .iter()
            .filter_map(|word| self.vectorize_word(word))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_table() -> WordTable {
        WordTable::from_entries(
            2,
            vec![
                ("box".to_string(), vec![1.0, 0.0]),
                ("office".to_string(), vec![0.0, 1.0]),
                ("####".to_string(), vec![0.5, 0.5]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn numeric_words_fall_back_to_placeholder() {
        let table = sample_table();
        assert_eq!(table.vectorize_word("1977"), Some(vec![0.5, 0.5]));
        assert_eq!(table.vectorize_word("19770"), None);
        assert_eq!(table.vectorize_word("abcd"), None);
    }

    #[test]
    fn unknown_words_are_dropped_from_context() {
        let table = sample_table();
        let words = vec!["box".to_string(), "zzz".to_string(), "office".to_string()];
        assert_eq!(table.vectorize_words(&words).len(), 2);
        assert_eq!(table.vectorize_context(&words), Some(vec![0.5, 0.5]));
    }

    #[test]
    fn empty_or_unknown_context_is_unknown() {
        let table = sample_table();
        assert_eq!(table.vectorize_context(&[]), None);
        assert_eq!(table.vectorize_context(&["nope".to_string()]), None);
    }

    #[test]
    fn rejects_wrong_dimension_entries() {
        let err = WordTable::from_entries(3, vec![("a".to_string(), vec![1.0])]).unwrap_err();
        assert!(matches!(
            err,
            CtxError::DimensionMismatch {
                expected: 3,
                found: 1
            }
        ));
    }

    #[test]
    fn loads_text_format_with_header() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "3 2").unwrap();
        writeln!(file, "box 1.0 0.0").unwrap();
        writeln!(file, "broken 1.0").unwrap();
        writeln!(file, "office 0.0 1.0").unwrap();
        let table = WordTable::load(file.path(), VectorFormat::Text, None).unwrap();
        assert_eq!(table.dimension(), 2);
        assert_eq!(table.len(), 2);
        assert!(!table.contains("broken"));
    }

    #[test]
    fn loads_text_format_without_header_and_limit() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "box 1.0 0.0 0.0").unwrap();
        writeln!(file, "office 0.0 1.0 0.0").unwrap();
        writeln!(file, "gross 0.0 0.0 1.0").unwrap();
        let table = WordTable::load_text(file.path(), Some(2)).unwrap();
        assert_eq!(table.dimension(), 3);
        assert_eq!(table.len(), 2);
        assert!(!table.contains("gross"));
    }

    #[test]
    fn loads_binary_format() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"2 2\n").unwrap();
        for (word, values) in [("box", [1.0f32, 0.0]), ("##", [0.25, 0.75])] {
            file.write_all(word.as_bytes()).unwrap();
            file.write_all(b" ").unwrap();
            for value in values {
                file.write_all(&value.to_le_bytes()).unwrap();
            }
            file.write_all(b"\n").unwrap();
        }
        let table = WordTable::load(file.path(), VectorFormat::Binary, None).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.vectorize_word("box"), Some(vec![1.0, 0.0]));
        assert_eq!(table.vectorize_word("42"), Some(vec![0.25, 0.75]));
    }

    #[test]
    fn binary_header_dimension_is_bounded() {
        for header in [&b"1 4611686018427387904\nx "[..], b"1 0\nx "] {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            file.write_all(header).unwrap();
            let err = WordTable::load_binary(file.path(), None).unwrap_err();
            assert!(matches!(err, CtxError::VectorFormat { .. }));
        }
    }

    #[test]
    fn binary_header_must_be_numeric() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a header\n").unwrap();
        let err = WordTable::load_binary(file.path(), None).unwrap_err();
        assert!(matches!(err, CtxError::VectorFormat { .. }));
    }
}
