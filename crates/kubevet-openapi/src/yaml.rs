//! YAML document boundaries
//!
//! Multi-document files are split on the `---` separator line. A document
//! consisting only of comments, whitespace, or separators is empty and is
//! skipped by every consumer (ingestion treats it as nothing, validation
//! treats it as success).

/// Split multi-document YAML on the `\n---\n` delimiter
pub fn split_yaml_documents(bytes: &[u8]) -> Vec<&[u8]> {
    let mut documents = Vec::new();
    let mut start = 0;
    let mut offset = 0;

    for line in bytes.split_inclusive(|&b| b == b'\n') {
        if trim_line(line) == b"---" {
            documents.push(&bytes[start..offset]);
            start = offset + line.len();
        }
        offset += line.len();
    }
    documents.push(&bytes[start..]);
    documents
}

/// True when a document holds only comments, whitespace, or separators
pub fn is_empty_yaml_document(document: &[u8]) -> bool {
    document.split(|&b| b == b'\n').all(|line| {
        let line = trim_line(line);
        line.is_empty() || line.starts_with(b"#") || line == b"---"
    })
}

fn trim_line(line: &[u8]) -> &[u8] {
    let mut slice = line;
    while let Some((first, rest)) = slice.split_first() {
        if first.is_ascii_whitespace() {
            slice = rest;
        } else {
            break;
        }
    }
    while let Some((last, rest)) = slice.split_last() {
        if last.is_ascii_whitespace() {
            slice = rest;
        } else {
            break;
        }
    }
    slice
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_documents() {
        let docs = split_yaml_documents(b"a: 1\n---\nb: 2\n---\n# comment\n");
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0], b"a: 1\n");
        assert_eq!(docs[1], b"b: 2\n");
        assert!(is_empty_yaml_document(docs[2]));
        assert!(!is_empty_yaml_document(docs[0]));
    }

    #[test]
    fn test_single_document() {
        let docs = split_yaml_documents(b"a: 1\n");
        assert_eq!(docs, vec![b"a: 1\n" as &[u8]]);
    }

    #[test]
    fn test_leading_separator() {
        let docs = split_yaml_documents(b"---\na: 1\n");
        assert_eq!(docs.len(), 2);
        assert!(is_empty_yaml_document(docs[0]));
        assert_eq!(docs[1], b"a: 1\n");
    }

    #[test]
    fn test_empty_document_detection() {
        assert!(is_empty_yaml_document(b""));
        assert!(is_empty_yaml_document(b"# just a comment\n"));
        assert!(is_empty_yaml_document(b"  \n\t\n"));
        assert!(is_empty_yaml_document(b"---\n# note\n"));
        assert!(!is_empty_yaml_document(b"kind: ConfigMap\n"));
    }

    #[test]
    fn test_separator_inside_string_not_split() {
        // only a bare `---` line is a document boundary
        let docs = split_yaml_documents(b"a: \"x --- y\"\n");
        assert_eq!(docs.len(), 1);
    }
}
