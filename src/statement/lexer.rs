use chumsky::prelude::*;

/// Split a statement line into whitespace-separated word tokens.
///
/// Every maximal run of non-whitespace characters is one token; there is
/// no quoting, so an email like `a@b.com` is a single word.
pub fn lexer<'a>() -> impl Parser<'a, &'a str, Vec<&'a str>, extra::Err<Rich<'a, char>>> {
    let word = any()
        .filter(|c: &char| !c.is_whitespace())
        .repeated()
        .at_least(1)
        .to_slice();

    word.padded().repeated().collect::<Vec<_>>().padded()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<&str> {
        lexer().parse(input).into_result().unwrap()
    }

    #[test]
    fn test_splits_on_whitespace() {
        assert_eq!(
            tokens("insert 1 user1 person1@example.com"),
            vec!["insert", "1", "user1", "person1@example.com"]
        );
    }

    #[test]
    fn test_collapses_runs_of_whitespace() {
        assert_eq!(tokens("  insert\t1   a  b "), vec!["insert", "1", "a", "b"]);
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert_eq!(tokens(""), Vec::<&str>::new());
        assert_eq!(tokens("   "), Vec::<&str>::new());
    }
}
