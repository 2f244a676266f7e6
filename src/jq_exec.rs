//! jq pre-filtering of input documents, via jaq.
use anyhow::{anyhow, Context, Result};
use jaq_core::{load, Compiler, Ctx, RcIter};
use jaq_json::Val;
use serde_json::Value;

/// Runs `filter_src` over one document and returns every output as JSON.
/// Failures name `source`, the label of the document being filtered.
pub fn run_jaq(filter_src: &str, input: &Value, source: &str) -> Result<Vec<Value>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File { code: filter_src, path: () };

    let modules = loader.load(&arena, program).map_err(|errs| {
        filter_error(source, filter_src, errs.into_iter().map(|(_, err)| format!("parse error: {err:?}")))
    })?;

    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(|errs| {
            let messages = errs
                .into_iter()
                .flat_map(|(_, undefined)| undefined)
                .map(|(name, undef)| format!("undefined `{name}`: {undef:?}"));
            filter_error(source, filter_src, messages)
        })?;

    let inputs = RcIter::new(core::iter::empty());
    let mut it = filter.run((Ctx::new([], &inputs), Val::from(input.clone())));

    let mut out = Vec::new();
    while let Some(item) = it.next() {
        let v = item.map_err(|e| filter_error(source, filter_src, [format!("{e:?}")]))?;
        // Val renders as JSON text
        let text = v.to_string();
        let json = serde_json::from_str::<Value>(&text)
            .with_context(|| format!("jq output for ({source}) is not valid JSON: {text}"))?;
        out.push(json);
    }
    tracing::trace!(filter = filter_src, source, outputs = out.len(), "applied jq filter");
    Ok(out)
}

fn filter_error(source: &str, filter_src: &str, messages: impl IntoIterator<Item = String>) -> anyhow::Error {
    let messages: Vec<String> = messages.into_iter().collect();
    anyhow!("jq filter `{filter_src}` failed on ({source}): {}", messages.join("; "))
}
