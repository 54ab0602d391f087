use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
}

/// Rewrite numbered `$N` placeholders to the `SQLite` form `?N`.
///
/// Placeholders inside single-quoted literals and double-quoted identifiers are left
/// untouched. Returns the input unchanged (borrowed) when nothing needs rewriting.
#[must_use]
pub fn sqlite_placeholders(sql: &str) -> Cow<'_, str> {
    if !sql.contains('$') {
        return Cow::Borrowed(sql);
    }

    let mut out = String::with_capacity(sql.len());
    let mut state = State::Normal;
    let mut changed = false;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Normal => {
                if c == '\'' {
                    state = State::SingleQuoted;
                } else if c == '"' {
                    state = State::DoubleQuoted;
                } else if c == '$' && chars.peek().is_some_and(char::is_ascii_digit) {
                    out.push('?');
                    changed = true;
                    continue;
                }
            }
            State::SingleQuoted => {
                if c == '\'' {
                    state = State::Normal;
                }
            }
            State::DoubleQuoted => {
                if c == '"' {
                    state = State::Normal;
                }
            }
        }
        out.push(c);
    }

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_dollar_to_question() {
        let sql = r#"UPDATE "user" SET pin = $1, first_name = $2 WHERE id = $10"#;
        assert_eq!(
            sqlite_placeholders(sql),
            r#"UPDATE "user" SET pin = ?1, first_name = ?2 WHERE id = ?10"#
        );
    }

    #[test]
    fn skips_quoted_text() {
        let sql = "SELECT '$1', \"$2\" FROM t WHERE a = $3";
        assert_eq!(sqlite_placeholders(sql), "SELECT '$1', \"$2\" FROM t WHERE a = ?3");
    }

    #[test]
    fn borrows_when_unchanged() {
        assert!(matches!(
            sqlite_placeholders("SELECT id FROM account"),
            Cow::Borrowed(_)
        ));
        assert!(matches!(
            sqlite_placeholders("SELECT '$1' FROM account"),
            Cow::Borrowed(_)
        ));
    }
}
