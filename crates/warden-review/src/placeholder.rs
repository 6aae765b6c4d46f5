//! `{name}` placeholder substitution.

use std::collections::BTreeMap;

use warden_core::WardenError;

/// Values available to one rendering.
pub type Vars<'a> = BTreeMap<&'a str, String>;

/// Replace every `{name}` in `template` with its value.
///
/// `{{` and `}}` stand for literal braces. A lone `}` is kept as is.
///
/// # Errors
///
/// Returns [`WardenError::TemplateRender`] naming the first placeholder with
/// no value, or an unterminated one.
///
/// # Examples
///
/// ```
/// use warden_review::placeholder::{fill, Vars};
///
/// let mut vars = Vars::new();
/// vars.insert("sig", "sig-storage".to_string());
/// assert_eq!(fill("notify {sig} {{owners}}", &vars).unwrap(), "notify sig-storage {owners}");
/// assert!(fill("notify {owners}", &vars).is_err());
/// ```
pub fn fill(template: &str, vars: &Vars<'_>) -> Result<String, WardenError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                if !closed {
                    return Err(WardenError::TemplateRender { placeholder: name });
                }
                match vars.get(name.as_str()) {
                    Some(value) => out.push_str(value),
                    None => return Err(WardenError::TemplateRender { placeholder: name }),
                }
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&'static str, &str)]) -> Vars<'static> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(fill("no placeholders | here", &Vars::new()).unwrap(), "no placeholders | here");
    }

    #[test]
    fn repeated_placeholders_are_all_filled() {
        let v = vars(&[("lang", "Python/GO")]);
        assert_eq!(fill("{lang} and {lang}", &v).unwrap(), "Python/GO and Python/GO");
    }

    #[test]
    fn unknown_placeholder_is_named() {
        match fill("ask {owners}", &vars(&[("sig", "a")])) {
            Err(WardenError::TemplateRender { placeholder }) => assert_eq!(placeholder, "owners"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unterminated_placeholder_fails() {
        assert!(fill("ask {owners", &vars(&[("owners", "x")])).is_err());
    }

    #[test]
    fn non_ascii_text_is_preserved() {
        let v = vars(&[("sig", "sig-storage")]);
        assert_eq!(fill("需要 {sig} 的所有 maintainer 同意", &v).unwrap(), "需要 sig-storage 的所有 maintainer 同意");
    }
}
