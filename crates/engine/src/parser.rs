//! Tokenizer and classifier: raw lines in, typed entries out.

use crate::domain::{is_misspelled_relationship, is_root_domain, root_domain};
use crate::error::ParseErrorCode;
use crate::model::{Entry, Record, Relationship, Variable, VariableType, GENERATED_LINE};

/// Classify one raw line.
///
/// Blank and comment lines yield `None`. A `TYPE=value` line against the
/// fixed variable set yields a Variable. Everything else is a Record —
/// valid, or invalid with exactly one error code. Trailing `#comment`
/// text is tolerated on every line.
pub fn parse_line(line: &str, line_number: i32) -> Option<Entry> {
    let raw_line = line.trim_end_matches(['\r', '\n']).to_string();

    let without_comment = match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    };
    let trimmed = without_comment.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Variable lines: `=` ahead of any comma. MANAGERDOMAIN values may
    // legitimately carry a `,<COUNTRY>` suffix after the `=`.
    if let Some(eq_idx) = trimmed.find('=') {
        let comma_idx = trimmed.find(',');
        if comma_idx.map_or(true, |c| eq_idx < c) {
            let key = trimmed[..eq_idx].trim();
            let value = trimmed[eq_idx + 1..].trim();
            match VariableType::parse(key) {
                Some(variable_type) if !value.is_empty() => {
                    return Some(Entry::Variable(Variable {
                        variable_type,
                        value: value.to_string(),
                        line_number,
                        raw_line,
                    }));
                }
                Some(_) => {
                    return Some(Entry::Record(invalid_record(
                        ParseErrorCode::InvalidFormat,
                        &[],
                        line_number,
                        raw_line,
                    )));
                }
                None if comma_idx.is_none() => {
                    return Some(Entry::Record(invalid_record(
                        ParseErrorCode::InvalidFormat,
                        &[],
                        line_number,
                        raw_line,
                    )));
                }
                // Unknown key ahead of commas: fall through and let the
                // record grammar have a go at the line.
                None => {}
            }
        }
    }

    let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
    if fields.len() < 3 {
        return Some(Entry::Record(invalid_record(
            ParseErrorCode::MissingFields,
            &fields,
            line_number,
            raw_line,
        )));
    }

    // Relationship slot: normally the third field; a fourth field is
    // accepted in its place when the third holds something else.
    let (relationship, cert_idx) = match Relationship::parse(fields[2]) {
        Some(rel) => (rel, 3),
        None => match fields.get(3).and_then(|f| Relationship::parse(f)) {
            Some(rel) => (rel, 4),
            None => {
                let candidate = if fields.len() >= 4 { fields[3] } else { fields[2] };
                let code = if is_misspelled_relationship(candidate) {
                    ParseErrorCode::MisspelledRelationship
                } else {
                    ParseErrorCode::InvalidRelationship
                };
                return Some(Entry::Record(invalid_record(code, &fields, line_number, raw_line)));
            }
        },
    };

    if !is_root_domain(fields[0]) {
        return Some(Entry::Record(invalid_record(
            ParseErrorCode::InvalidRootDomain,
            &fields,
            line_number,
            raw_line,
        )));
    }

    if fields[1].is_empty() {
        return Some(Entry::Record(invalid_record(
            ParseErrorCode::EmptyAccountId,
            &fields,
            line_number,
            raw_line,
        )));
    }

    Some(Entry::Record(Record {
        domain: fields[0].to_string(),
        account_id: fields[1].to_string(),
        account_type: fields[2].to_string(),
        relationship: Some(relationship),
        certification_authority_id: fields
            .get(cert_idx)
            .map(|s| s.to_string())
            .filter(|s| !s.is_empty()),
        line_number,
        raw_line,
        error: None,
        warnings: Vec::new(),
        validation: None,
        duplicate_domain: None,
    }))
}

/// Parse a whole document. Entries come back in line order; blank and
/// comment lines are dropped. When `publisher_domain` is supplied and the
/// document declares no OWNERDOMAIN, a default one (the publisher's root
/// domain) is appended once, marked with the generated-line sentinel.
pub fn parse_content(text: &str, publisher_domain: Option<&str>) -> Vec<Entry> {
    let mut entries: Vec<Entry> = text
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| parse_line(line, (idx + 1) as i32))
        .collect();

    if let Some(publisher) = publisher_domain {
        let has_owner_domain = entries.iter().any(|e| {
            matches!(e, Entry::Variable(v) if v.variable_type == VariableType::OwnerDomain)
        });
        if !has_owner_domain {
            if let Some(root) = root_domain(publisher) {
                entries.push(Entry::Variable(Variable {
                    variable_type: VariableType::OwnerDomain,
                    raw_line: format!("OWNERDOMAIN={root}"),
                    value: root,
                    line_number: GENERATED_LINE,
                }));
            }
        }
    }

    entries
}

fn invalid_record(
    code: ParseErrorCode,
    fields: &[&str],
    line_number: i32,
    raw_line: String,
) -> Record {
    Record {
        domain: fields.first().unwrap_or(&"").to_string(),
        account_id: fields.get(1).unwrap_or(&"").to_string(),
        account_type: fields.get(2).unwrap_or(&"").to_string(),
        relationship: None,
        certification_authority_id: None,
        line_number,
        raw_line,
        error: Some(code),
        warnings: Vec::new(),
        validation: None,
        duplicate_domain: None,
    }
}
