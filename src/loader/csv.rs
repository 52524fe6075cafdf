//! String table CSV reader
//!
//! The table has a header row naming its columns; only `id` and `text` are
//! used. Fields follow RFC 4180 quoting: a quoted field may contain commas,
//! newlines, and doubled quotes.

use crate::types::StringTable;

/// Parse a line table for `locale`
pub fn parse_string_table(csv: &str, locale: &str) -> anyhow::Result<StringTable> {
    let csv = csv.strip_prefix('\u{feff}').unwrap_or(csv);
    let mut records = parse_records(csv)?.into_iter();

    let header = records
        .next()
        .ok_or_else(|| anyhow::anyhow!("string table is empty"))?;
    let column = |name: &str| {
        header
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| anyhow::anyhow!("string table has no '{}' column", name))
    };
    let id_col = column("id")?;
    let text_col = column("text")?;

    let mut table = StringTable::new(locale);
    for (row, record) in records.enumerate() {
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let (Some(id), Some(text)) = (record.get(id_col), record.get(text_col)) else {
            anyhow::bail!(
                "row {} has {} fields, expected at least {}",
                row + 2,
                record.len(),
                id_col.max(text_col) + 1
            );
        };
        if table.lines.insert(id.clone(), text.clone()).is_some() {
            anyhow::bail!("duplicate line id '{}' at row {}", id, row + 2);
        }
    }
    Ok(table)
}

/// Split CSV text into records of fields
fn parse_records(csv: &str) -> anyhow::Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = csv.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        anyhow::bail!("unterminated quoted field");
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_id_and_text_columns() {
        let csv = "id,text,file,node,lineNumber\n\
                   line:1,Good morning.,Main,Start,3\n\
                   line:2,\"Well, well.\",Main,Start,4\n";
        let table = parse_string_table(csv, "en-US").unwrap();

        assert_eq!(table.locale, "en-US");
        assert_eq!(table.len(), 2);
        assert_eq!(table.lines["line:1"], "Good morning.");
        assert_eq!(table.lines["line:2"], "Well, well.");
    }

    #[test]
    fn quoted_fields_keep_quotes_and_newlines() {
        let csv = "text,id\r\n\"She said \"\"hush\"\"\nand left\",line:q\r\n";
        let table = parse_string_table(csv, "en-US").unwrap();
        assert_eq!(table.lines["line:q"], "She said \"hush\"\nand left");
    }

    #[test]
    fn leading_byte_order_mark_is_ignored() {
        let csv = "\u{feff}id,text\nline:1,Hi\n";
        let table = parse_string_table(csv, "en-US").unwrap();
        assert_eq!(table.lines["line:1"], "Hi");
    }

    #[test]
    fn missing_column_and_duplicates_are_errors() {
        assert!(parse_string_table("id,body\nline:1,x\n", "en-US").is_err());
        assert!(parse_string_table("id,text\nline:1,a\nline:1,b\n", "en-US").is_err());
        assert!(parse_string_table("id,text\nline:1,\"open\n", "en-US").is_err());
    }
}
