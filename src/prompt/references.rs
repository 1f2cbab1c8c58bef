//! Reference document block.
//!
//! Each reference is framed by a header that declares its position and its
//! length in characters, so content containing newlines, `---` or even a
//! lookalike frame is carried verbatim and can be split back unambiguously.

pub const NO_REFERENCE_MARKER: &str = "참고할 과거 데이터가 없습니다.";

const SECTION_TITLE: &str = "[참고 문서]";
const FRAME_OPEN: &str = "<<참고 문서 ";
const FRAME_CLOSE: &str = "<</참고 문서 ";

pub fn encode_references(references: &[String]) -> String {
    let total = references.len();
    let mut out = format!("{} 총 {}건\n", SECTION_TITLE, total);

    if references.is_empty() {
        out.push_str(NO_REFERENCE_MARKER);
        out.push('\n');
        return out;
    }

    for (idx, content) in references.iter().enumerate() {
        let position = idx + 1;
        out.push_str(&format!(
            "{}{}/{} · {}자>>\n{}\n{}{}>>\n",
            FRAME_OPEN,
            position,
            total,
            content.chars().count(),
            content,
            FRAME_CLOSE,
            position
        ));
        if position < total {
            out.push('\n');
        }
    }
    out
}

/// Inverse of [`encode_references`]; `None` when the block is malformed.
pub fn decode_references(block: &str) -> Option<Vec<String>> {
    let rest = block.strip_prefix(SECTION_TITLE)?.strip_prefix(" 총 ")?;
    let (count, mut rest) = rest.split_once("건\n")?;
    let total: usize = count.parse().ok()?;

    if total == 0 {
        return (rest.trim_end() == NO_REFERENCE_MARKER).then(Vec::new);
    }

    let mut references = Vec::with_capacity(total);
    for position in 1..=total {
        rest = rest.strip_prefix(FRAME_OPEN)?;
        let (header, body) = rest.split_once(">>\n")?;
        let (numbering, length) = header.split_once(" · ")?;
        if numbering != format!("{}/{}", position, total) {
            return None;
        }
        let length: usize = length.strip_suffix('자')?.parse().ok()?;

        let byte_len = body
            .char_indices()
            .nth(length)
            .map(|(i, _)| i)
            .unwrap_or(body.len());
        if body[..byte_len].chars().count() != length {
            return None;
        }
        references.push(body[..byte_len].to_string());

        let closing = format!("\n{}{}>>\n", FRAME_CLOSE, position);
        rest = body[byte_len..].strip_prefix(closing.as_str())?;
        if position < total {
            rest = rest.strip_prefix('\n')?;
        }
    }

    rest.is_empty().then_some(references)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_uses_marker() {
        let block = encode_references(&[]);
        assert!(block.contains(NO_REFERENCE_MARKER));
        assert_eq!(decode_references(&block), Some(Vec::new()));
    }

    #[test]
    fn content_with_separators_survives() {
        let refs = vec![
            "첫 줄\n\n---\n\n둘째 줄".to_string(),
            "<</참고 문서 1>>\n가짜 닫기".to_string(),
            "---".to_string(),
        ];
        let block = encode_references(&refs);
        assert_eq!(decode_references(&block), Some(refs));
    }

    #[test]
    fn header_declares_position_and_length() {
        let block = encode_references(&["가나다".to_string()]);
        assert!(block.starts_with("[참고 문서] 총 1건\n<<참고 문서 1/1 · 3자>>\n가나다\n"));
    }

    #[test]
    fn truncated_block_is_rejected() {
        let block = encode_references(&["abc".to_string(), "def".to_string()]);
        let truncated = &block[..block.len() - 5];
        assert_eq!(decode_references(truncated), None);
    }
}
