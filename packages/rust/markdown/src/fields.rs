//! Enrichment of parsed Lodestone JSON with Markdown and component fields.

use serde_json::{Map, Number, Value, json};

use crate::LodestoneConverter;

/// Walk `data` and rewrite the fields API consumers read.
///
/// - `date` (any case): epoch seconds become epoch milliseconds.
/// - `description` (any case) holding a string: replaced with
///   `{html, markdown, discord_components_v2}`, truncated against a sibling `link`.
/// - `title` (any case) holding a string: HTML entities decoded.
///
/// Everything else is copied, recursing into objects and arrays.
pub(crate) fn add_markdown_fields(converter: &LodestoneConverter, data: Value) -> Value {
    match data {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| add_markdown_fields(converter, item))
                .collect(),
        ),
        Value::Object(map) => Value::Object(enrich_object(converter, map)),
        other => other,
    }
}

fn enrich_object(converter: &LodestoneConverter, map: Map<String, Value>) -> Map<String, Value> {
    let link = map.get("link").and_then(Value::as_str).map(str::to_owned);

    map.into_iter()
        .map(|(key, value)| {
            let lowered = key.to_ascii_lowercase();
            let value = match (lowered.as_str(), value) {
                ("date", Value::Number(n)) => Value::Number(seconds_to_millis(n)),
                ("description", Value::String(html)) => {
                    describe(converter, html, link.as_deref())
                }
                ("title", Value::String(title)) => Value::String(decode_title(&title)),
                (_, nested @ (Value::Object(_) | Value::Array(_))) => {
                    add_markdown_fields(converter, nested)
                }
                (_, other) => other,
            };
            (key, value)
        })
        .collect()
}

fn seconds_to_millis(n: Number) -> Number {
    if let Some(seconds) = n.as_i64() {
        if let Some(millis) = seconds.checked_mul(1000) {
            return Number::from(millis);
        }
    }
    n.as_f64()
        .and_then(|seconds| Number::from_f64(seconds * 1000.0))
        .unwrap_or(n)
}

fn describe(converter: &LodestoneConverter, html: String, link: Option<&str>) -> Value {
    let markdown = converter.convert(&html, link);
    let components = converter.parse_to_components(&html, link);
    json!({
        "html": html,
        "markdown": markdown,
        "discord_components_v2": components,
    })
}

/// Decode HTML entities, mapping the no-break space to a plain space.
pub fn decode_title(title: &str) -> String {
    html_escape::decode_html_entities(title).replace('\u{a0}', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestone_shared::ConverterConfig;

    fn converter() -> LodestoneConverter {
        LodestoneConverter::new(ConverterConfig::default())
    }

    #[test]
    fn date_and_description_are_enriched() {
        let data = json!({"date": 1700000000, "description": "<p>hello</p>"});
        let out = add_markdown_fields(&converter(), data);

        assert_eq!(out["date"], json!(1700000000000i64));
        assert_eq!(out["description"]["html"], "<p>hello</p>");
        assert_eq!(out["description"]["markdown"], "hello");
        assert_eq!(
            out["description"]["discord_components_v2"],
            json!({"components": [{"type": "text_display", "content": "hello"}]})
        );
    }

    #[test]
    fn keys_match_case_insensitively() {
        let data = json!({"Date": 2, "DESCRIPTION": "<p>x</p>", "Title": "A &amp; B"});
        let out = add_markdown_fields(&converter(), data);
        assert_eq!(out["Date"], json!(2000));
        assert_eq!(out["DESCRIPTION"]["markdown"], "x");
        assert_eq!(out["Title"], "A & B");
    }

    #[test]
    fn titles_decode_common_entities() {
        assert_eq!(
            decode_title("&lt;Tips&gt; &quot;Q&amp;A&quot;&nbsp;&#39;25"),
            "<Tips> \"Q&A\" '25"
        );
    }

    #[test]
    fn nested_arrays_are_walked() {
        let data = json!({
            "topics": [
                {"title": "Patch&nbsp;7.3", "date": 1, "link": "https://eu.finalfantasyxiv.com/lodestone/topics/detail/1"},
                {"title": "Plain", "date": 1.5}
            ],
            "count": 2
        });
        let out = add_markdown_fields(&converter(), data);
        assert_eq!(out["topics"][0]["title"], "Patch 7.3");
        assert_eq!(out["topics"][0]["date"], json!(1000));
        assert_eq!(out["topics"][1]["date"], json!(1500.0));
        assert_eq!(out["count"], json!(2));
    }

    #[test]
    fn sibling_link_feeds_truncation() {
        let long = format!("<p>{}</p>", "news ".repeat(600));
        let link = "https://eu.finalfantasyxiv.com/lodestone/news/detail/abc";
        let out = add_markdown_fields(&converter(), json!({"description": long, "link": link}));
        let markdown = out["description"]["markdown"].as_str().unwrap();
        assert!(markdown.chars().count() <= 2000);
        assert!(markdown.ends_with(&format!("({link})*")));
        assert_eq!(out["link"], link);
    }

    #[test]
    fn scalars_pass_through() {
        assert_eq!(add_markdown_fields(&converter(), json!("text")), json!("text"));
        assert_eq!(add_markdown_fields(&converter(), Value::Null), Value::Null);
        let out = add_markdown_fields(&converter(), json!({"date": "soon", "description": 5}));
        assert_eq!(out, json!({"date": "soon", "description": 5}));
    }
}
