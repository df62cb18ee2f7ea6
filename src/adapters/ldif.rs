//! Streaming reader for LDIF content records (RFC 2849).
//!
//! Supported: comments, folded lines, `version: 1`, `attr: value`,
//! base64 `attr:: value` and `changetype: add`. Other change types and
//! `attr:< url` values are rejected.

use crate::domain::model::{Attributes, ImportRecord};
use crate::utils::error::{FixtureError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io::{BufRead, Lines};

pub struct LdifReader<R: BufRead> {
    lines: Lines<R>,
    line_no: usize,
    pending: Option<(usize, String)>,
    finished: bool,
}

impl<R: BufRead> LdifReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            pending: None,
            finished: false,
        }
    }

    fn physical_line(&mut self) -> Option<Result<(usize, String)>> {
        if let Some(pending) = self.pending.take() {
            return Some(Ok(pending));
        }
        let line = self.lines.next()?;
        self.line_no += 1;
        Some(
            line.map(|l| (self.line_no, l.trim_end_matches('\r').to_string()))
                .map_err(FixtureError::IoError),
        )
    }

    /// Next line with continuation lines folded in.
    fn logical_line(&mut self) -> Option<Result<(usize, String)>> {
        let (start, mut line) = match self.physical_line()? {
            Ok(value) => value,
            Err(e) => return Some(Err(e)),
        };

        loop {
            match self.physical_line() {
                None => break,
                Some(Err(e)) => return Some(Err(e)),
                Some(Ok((no, next))) => {
                    if let Some(rest) = next.strip_prefix(' ') {
                        line.push_str(rest);
                    } else {
                        self.pending = Some((no, next));
                        break;
                    }
                }
            }
        }

        Some(Ok((start, line)))
    }

    fn read_record(&mut self) -> Result<Option<ImportRecord>> {
        let mut dn: Option<(usize, String)> = None;
        let mut attributes = Attributes::new();

        while let Some(line) = self.logical_line() {
            let (no, line) = line?;

            if line.is_empty() {
                if dn.is_some() {
                    break;
                }
                continue;
            }
            if line.starts_with('#') {
                continue;
            }

            let (name, value) = parse_line(no, &line)?;

            if dn.is_none() {
                if name.eq_ignore_ascii_case("version") {
                    if value != "1" {
                        return Err(parse_error(no, format!("unsupported LDIF version {}", value)));
                    }
                    continue;
                }
                if !name.eq_ignore_ascii_case("dn") {
                    return Err(parse_error(no, format!("expected 'dn:' but found '{}'", name)));
                }
                dn = Some((no, value));
                continue;
            }

            if name.eq_ignore_ascii_case("changetype") {
                if !value.eq_ignore_ascii_case("add") {
                    return Err(parse_error(no, format!("unsupported changetype '{}'", value)));
                }
                continue;
            }
            if name.eq_ignore_ascii_case("dn") {
                return Err(parse_error(no, "missing blank line between records".to_string()));
            }

            attributes.add(&name, value);
        }

        match dn {
            None => Ok(None),
            Some((no, _)) if attributes.is_empty() => {
                Err(parse_error(no, "entry has no attributes".to_string()))
            }
            Some((_, dn)) => Ok(Some(ImportRecord::new(dn, attributes))),
        }
    }
}

impl<R: BufRead> Iterator for LdifReader<R> {
    type Item = Result<ImportRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

fn parse_line(no: usize, line: &str) -> Result<(String, String)> {
    let (name, rest) = line
        .split_once(':')
        .ok_or_else(|| parse_error(no, format!("missing ':' in '{}'", line)))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(parse_error(no, "empty attribute name".to_string()));
    }

    let value = if let Some(encoded) = rest.strip_prefix(':') {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| parse_error(no, format!("invalid base64 value: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|_| parse_error(no, "base64 value is not UTF-8".to_string()))?
    } else if rest.starts_with('<') {
        return Err(parse_error(no, "URL values are not supported".to_string()));
    } else {
        rest.trim().to_string()
    };

    Ok((name.to_string(), value))
}

fn parse_error(line: usize, message: String) -> FixtureError {
    FixtureError::LdifParse { line, message }
}
