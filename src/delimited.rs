use crate::error::ConvertError;

/// Headers plus rows, every row padded to the header width. Re-parsing
/// produces a fresh value; nothing mutates an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn parse(raw_text: &str) -> Result<RawTable, ConvertError> {
    let text = raw_text.strip_prefix('\u{FEFF}').unwrap_or(raw_text);

    let lines = text
        .split(['\n', '\r'])
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>();

    if lines.is_empty() {
        return Err(ConvertError::EmptyInput);
    }

    let delimiter = detect_delimiter(lines[0]);
    tracing::debug!(delimiter = %delimiter.escape_default(), "delimiter detected");

    let headers = split_line(lines[0], delimiter);

    let mut rows = Vec::with_capacity(lines.len() - 1);
    for line in &lines[1..] {
        let mut fields = split_line(line, delimiter);
        if fields.is_empty() {
            continue;
        }
        fields.resize(headers.len(), String::new());
        rows.push(fields);
    }

    Ok(RawTable { headers, rows })
}

/// Looks only at the first line. Ties go to the comma.
pub(crate) fn detect_delimiter(first_line: &str) -> char {
    let commas = first_line.matches(',').count();
    let semicolons = first_line.matches(';').count();
    let tabs = first_line.matches('\t').count();

    if tabs > commas && tabs > semicolons {
        '\t'
    } else if semicolons > commas {
        ';'
    } else {
        ','
    }
}

pub(crate) fn split_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '"' {
            if in_quotes && chars.peek() == Some(&'"') {
                current.push('"');
                chars.next();
            } else {
                in_quotes = !in_quotes;
                current.push('"');
            }
        } else if ch == delimiter && !in_quotes {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    fields.push(current);

    fields
        .into_iter()
        .map(|field| unwrap_quotes(field.trim()))
        .collect()
}

fn unwrap_quotes(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value[1..value.len() - 1].to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{detect_delimiter, parse, split_line};
    use crate::error::ConvertError;

    #[test]
    fn strips_bom_and_blank_lines() {
        let table = parse("\u{FEFF}a,b\n\n1,2\r\n\r3,4\n").expect("parse should succeed");
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(parse("\n \r\n\t\n"), Err(ConvertError::EmptyInput)));
    }

    #[test]
    fn detects_comma_by_default_and_on_ties() {
        assert_eq!(detect_delimiter("a,b,c,d;x"), ',');
        assert_eq!(detect_delimiter("a,b;c;d,"), ',');
        assert_eq!(detect_delimiter("plain"), ',');
    }

    #[test]
    fn detects_semicolon_when_it_wins() {
        assert_eq!(detect_delimiter("a;b;c,d"), ';');
    }

    #[test]
    fn detects_tab_only_when_strictly_ahead() {
        assert_eq!(detect_delimiter("a\tb\tc,d"), '\t');
        assert_eq!(detect_delimiter("a\tb,c"), ',');
    }

    #[test]
    fn escaped_quote_inside_quoted_field() {
        let fields = split_line(r#""A""B",1,2"#, ',');
        assert_eq!(fields, vec![r#"A"B"#, "1", "2"]);
    }

    #[test]
    fn delimiter_inside_quotes_does_not_split() {
        let fields = split_line(r#""a,b",c"#, ',');
        assert_eq!(fields, vec!["a,b", "c"]);
    }

    #[test]
    fn fields_are_trimmed_then_unwrapped() {
        let fields = split_line(r#"  x  , "y" "#, ',');
        assert_eq!(fields, vec!["x", "y"]);
    }

    #[test]
    fn short_rows_are_padded_to_header_width() {
        let table = parse("a,b,c\n1,2\n").expect("parse should succeed");
        assert_eq!(table.rows[0], vec!["1", "2", ""]);
    }

    #[test]
    fn cyrillic_headers_survive() {
        let table = parse("Точка,X,Y\nA,10,20\nB,30,40\n").expect("parse should succeed");
        assert_eq!(table.headers, vec!["Точка", "X", "Y"]);
        assert_eq!(table.rows.len(), 2);
    }
}
