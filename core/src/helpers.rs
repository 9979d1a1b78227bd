//! Conveniences for a few endpoints, built on the generic call API.

use std::io;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Value};

use crate::client::SwRetailClient;
use crate::error::DispatchError;
use crate::transport::Transport;
use crate::types::Outcome;

/// Upload an image for an article. The bytes are sent base64-encoded to the
/// `article_image` endpoint.
pub fn upload_article_image<T: Transport>(
    client: &mut SwRetailClient<T>,
    article_id: i64,
    image: &[u8],
    description: &str,
) -> Result<Outcome, DispatchError> {
    let mut body = Map::new();
    body.insert("image".to_string(), Value::from(STANDARD.encode(image)));
    body.insert("image_description".to_string(), Value::from(description));
    body.insert("article_id".to_string(), Value::from(article_id));
    client.post("article_image", body)
}

/// Like `upload_article_image`, reading the image from `path`.
pub fn upload_article_image_file<T: Transport>(
    client: &mut SwRetailClient<T>,
    article_id: i64,
    path: impl AsRef<Path>,
    description: &str,
) -> io::Result<Result<Outcome, DispatchError>> {
    let image = std::fs::read(path)?;
    Ok(upload_article_image(client, article_id, &image, description))
}

/// Result of a barcode lookup. `article_id` is `None` when the barcode is
/// unknown or the lookup failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarcodeMatch {
    pub article_id: Option<i64>,
    /// Position on the article's size ruler.
    pub position: Option<i64>,
    /// Every field of the response, including the two above.
    pub fields: Map<String, Value>,
}

pub fn barcode_lookup<T: Transport>(
    client: &mut SwRetailClient<T>,
    barcode: &str,
) -> Result<BarcodeMatch, DispatchError> {
    let outcome = client.get("barcode_lookup", vec![Value::from(barcode)])?;
    let fields = match outcome {
        Outcome::Success(Value::Object(fields)) => fields,
        _ => return Ok(BarcodeMatch::default()),
    };
    Ok(BarcodeMatch {
        article_id: fields.get("article_id").and_then(as_integer),
        position: fields.get("position").and_then(as_integer),
        fields,
    })
}

pub fn article_id_from_barcode<T: Transport>(
    client: &mut SwRetailClient<T>,
    barcode: &str,
) -> Result<Option<i64>, DispatchError> {
    Ok(barcode_lookup(client, barcode)?.article_id)
}

/// Ids arrive as numbers or numeric strings.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
