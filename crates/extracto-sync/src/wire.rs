//! Upstream extract response shape and its normalization into draw entries.
//!
//! The service is loose about its payload: values and positions arrive as
//! numbers or strings, under `n_numero`/`numero` and `n_ubica`/`posicion`
//! depending on the endpoint, and arrays may be `null`. All of that is
//! resolved here, once, so nothing downstream sees the raw shape.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use extracto_core::{DrawEntry, DrawSet};

/// Body of `GET /api/public/{organization}/extracto`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractoResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub numeros: Vec<RawNumero>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub modalidades: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub datosgenerales: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub premios: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub premiosganadores: Vec<Value>,
}

/// One raw `numeros` entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNumero {
    #[serde(default)]
    pub n_numero: Option<Value>,
    #[serde(default)]
    pub numero: Option<Value>,
    #[serde(default)]
    pub n_ubica: Option<Value>,
    #[serde(default)]
    pub posicion: Option<Value>,
    /// Jurisdiction.
    #[serde(default)]
    pub d_tipo: Option<Value>,
    /// Modality name.
    #[serde(default)]
    pub d_modal: Option<Value>,
    #[serde(default)]
    pub modalidad: Option<Value>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Text of a scalar JSON value; `None` for null, blanks and non-scalars.
fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn first_text(candidates: [&Option<Value>; 2]) -> Option<String> {
    candidates.into_iter().flatten().find_map(scalar_text)
}

/// Leading integer of a reported position: fractional numbers are
/// truncated and text is read up to its first non-digit.
fn position_of(value: &Value) -> Option<u32> {
    let position = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.trunc() as u64)
        })?,
        Value::String(s) => {
            let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()?
        }
        _ => return None,
    };
    u32::try_from(position).ok()
}

impl RawNumero {
    /// Normalize into a [`DrawEntry`]. `index` is the entry's zero-based
    /// place in `numeros`, used as the position when none is reported.
    pub fn normalize(&self, index: usize) -> Option<DrawEntry> {
        let value = first_text([&self.n_numero, &self.numero])?;
        let mut reported = [&self.n_ubica, &self.posicion]
            .into_iter()
            .flatten()
            .filter(|v| scalar_text(v).is_some())
            .peekable();
        // A zero position reads as unset, so the next field is tried.
        let position = if reported.peek().is_none() {
            u32::try_from(index + 1).ok()?
        } else {
            reported.filter_map(position_of).find(|&p| p > 0)?
        };
        DrawEntry::new(
            value,
            position,
            self.d_tipo.as_ref().and_then(scalar_text),
            first_text([&self.d_modal, &self.modalidad]),
        )
    }
}

impl ExtractoResponse {
    pub fn into_draw_set(self) -> DrawSet {
        let total = self.numeros.len();
        let entries: Vec<DrawEntry> = self
            .numeros
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| raw.normalize(i))
            .collect();
        if entries.len() < total {
            debug!(dropped = total - entries.len(), total, "dropped malformed draw entries");
        }
        DrawSet::new(entries)
    }
}
