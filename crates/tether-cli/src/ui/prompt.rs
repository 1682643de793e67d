//! Yes/no prompt on the attended terminal.

use console::Term;

/// Ask `question` and read a y/n answer. An empty answer picks `default`.
///
/// Blocks on terminal input; call from `spawn_blocking` in async code.
pub fn confirm(question: &str, default: bool) -> std::io::Result<bool> {
    let term = Term::stderr();
    let hint = if default { "Y/n" } else { "y/N" };
    term.write_str(&format!("? {question} ({hint}) "))?;
    let answer = term.read_line()?;
    Ok(parse_answer(&answer, default))
}

fn parse_answer(answer: &str, default: bool) -> bool {
    match answer.trim().to_ascii_lowercase().as_str() {
        "" => default,
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert!(parse_answer("", true));
        assert!(!parse_answer("", false));
        assert!(parse_answer("Yes\n", false));
        assert!(!parse_answer(" n ", true));
        assert!(parse_answer("maybe", true));
    }
}
