use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"));
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid space pattern"));

/// Sanitize a column name: no tags, no control chars, single spaces / 清理列名
pub fn sanitize_key(input: &str) -> String {
    let stripped = TAG_RE.replace_all(input, "");
    let visible: String = stripped
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    SPACE_RE.replace_all(visible.trim(), " ").into_owned()
}

/// Sanitize a cell value: like a textarea, newlines survive / 清理单元格值
pub fn sanitize_value(input: &str) -> String {
    let stripped = TAG_RE.replace_all(input, "");
    stripped
        .chars()
        .filter(|c| *c == '\n' || !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern / 转义LIKE通配符
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `%term%` with wildcards in `term` neutralised / 包含匹配模式
pub fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("  Company\tName \n"), "Company Name");
        assert_eq!(sanitize_key("<b>City</b>"), "City");
        assert_eq!(sanitize_key("\u{0007}"), "");
    }

    #[test]
    fn test_sanitize_value_keeps_newlines() {
        assert_eq!(sanitize_value(" line one\nline two\u{0000} "), "line one\nline two");
        assert_eq!(sanitize_value("<script>x</script>"), "x");
        assert_eq!(sanitize_value("   "), "");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern("plain"), "%plain%");
    }
}
