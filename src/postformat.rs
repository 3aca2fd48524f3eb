use serde::{Deserialize, Deserializer};

/// Average reading speed used for the read-time label.
const WORDS_PER_MINUTE: usize = 225;

/// URL slug for a post title.
pub fn permalink(title: &str) -> String {
    title
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

pub fn read_time(content: &str) -> String {
    let words = content.split_whitespace().count();
    format!("{} min read", words / WORDS_PER_MINUTE)
}

/// Split a comma-separated tag string, trimming and dropping empties.
pub fn parse_tags(raw: &str) -> Vec<String> {
    clean_tags(raw.split(','))
}

fn clean_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    tags.into_iter()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagsRepr {
    List(Vec<String>),
    Csv(String),
}

/// Accept tags either as a JSON array or a comma-separated string.
pub fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags = match Option::<TagsRepr>::deserialize(deserializer)? {
        Some(TagsRepr::List(list)) => clean_tags(list.iter().map(String::as_str)),
        Some(TagsRepr::Csv(raw)) => parse_tags(&raw),
        None => Vec::new(),
    };
    Ok(tags)
}
