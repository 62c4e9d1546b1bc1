use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Turns an `async fn` into a `#[test]` that runs on a fresh runtime.
///
/// Accepts an optional `max_park_ms = N` argument forwarded to
/// `RuntimeBuilder::max_park`.
///
/// ```rust,ignore
/// #[weft::test]
/// async fn resolves() {
///     assert!(weft::time::delay_true(Duration::ZERO).await.unwrap());
/// }
/// ```
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut tokens = item.into_iter().collect::<Vec<_>>();

    let Some(async_pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    else {
        return compile_error("#[weft::test] expects an `async fn`");
    };
    tokens.remove(async_pos);

    let Some(pos) = tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
    else {
        return compile_error("#[weft::test] expects a function body");
    };

    let block = match &tokens[pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => unreachable!(),
    };

    let mut builder = String::from("::weft::RuntimeBuilder::new()");

    for part in attr.to_string().split(',') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("max_park_ms") {
            let value = value.trim_start_matches(|c: char| c == '=' || c.is_whitespace());
            match value.parse::<u64>() {
                Ok(ms) => builder.push_str(&format!(
                    ".max_park(::std::time::Duration::from_millis({ms}))"
                )),
                Err(_) => return compile_error("max_park_ms expects an integer"),
            }
        } else if !part.is_empty() {
            return compile_error(&format!("unknown #[weft::test] argument `{part}`"));
        }
    }

    builder.push_str(".build()");

    let new_block = format!(
        "{{
        let runtime = {builder};
        runtime.block_on(async move {{ {block} }});
    }}"
    );

    let body = match new_block.parse::<TokenStream>() {
        Ok(body) => body,
        Err(err) => return compile_error(&format!("#[weft::test] error: {err}")),
    };

    tokens[pos] = TokenTree::Group(Group::new(Delimiter::Brace, body));

    let mut result: Vec<TokenTree> = "#[::core::prelude::v1::test]"
        .parse::<TokenStream>()
        .map(|ts| ts.into_iter().collect())
        .unwrap_or_default();
    result.extend(tokens);

    result.into_iter().collect()
}

fn compile_error(message: &str) -> TokenStream {
    format!("::core::compile_error!({message:?});")
        .parse()
        .unwrap_or_default()
}
