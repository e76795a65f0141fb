//! Ledger adapter over a JavaScript object.
//!
//! The host passes any object with these async methods:
//!
//! ```text
//! getTotalCount()            -> Promise<number | bigint>
//! getRecordAt(id)            -> Promise<RawRecord>
//! getRecordsBatch(ids)       -> Promise<Array<{ status: "success", result: RawRecord }
//!                                           | { status: "failure", error: any }>>
//! ```
//!
//! `RawRecord` is `{ packedColor, packedPosition, message?, owner?, txRef? }`.
//! The batch shape matches a multicall with `allowFailure: true`.

use futures::future::{FutureExt, LocalBoxFuture};
use js_sys::{Array, Function, Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::error::{PixelGridError, Result};
use crate::sync::{Ledger, RawRecord, RecordId, RecordOutcome};

const GET_TOTAL_COUNT: &str = "getTotalCount";
const GET_RECORD_AT: &str = "getRecordAt";
const GET_RECORDS_BATCH: &str = "getRecordsBatch";

pub struct JsLedger {
    target: JsValue,
}

impl JsLedger {
    /// Wrap a host object, checking that every required method exists.
    pub fn new(target: JsValue) -> Result<Self> {
        let ledger = Self { target };
        for method in [GET_TOTAL_COUNT, GET_RECORD_AT, GET_RECORDS_BATCH] {
            ledger.method(method)?;
        }
        Ok(ledger)
    }

    fn method(&self, name: &str) -> Result<Function> {
        Reflect::get(&self.target, &JsValue::from_str(name))
            .map_err(|e| PixelGridError::Js(js_message(&e)))?
            .dyn_into::<Function>()
            .map_err(|_| PixelGridError::Js(format!("ledger has no `{name}` method")))
    }

    async fn call(&self, name: &str, args: &[JsValue]) -> Result<JsValue> {
        let func = self.method(name)?;
        let args: Array = args.iter().collect();
        let returned = func
            .apply(&self.target, &args)
            .map_err(|e| PixelGridError::Ledger(format!("{name}: {}", js_message(&e))))?;
        JsFuture::from(Promise::resolve(&returned))
            .await
            .map_err(|e| PixelGridError::Ledger(format!("{name}: {}", js_message(&e))))
    }
}

fn id_arg(id: RecordId) -> JsValue {
    // Ledger ids are contract uint256 values; send them as BigInt.
    JsValue::bigint_from_str(&id.0.to_string())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_count(value: &JsValue) -> Result<u64> {
    if let Some(n) = value.as_f64() {
        if n.is_finite() && n >= 0.0 && n.fract().abs() < f64::EPSILON && n <= 9_007_199_254_740_991.0 {
            return Ok(n as u64);
        }
    } else if value.is_bigint() {
        let text: String = js_sys::BigInt::from(value.clone())
            .to_string(10)
            .map_err(|_| PixelGridError::Decode("unprintable bigint count".into()))?
            .into();
        if let Ok(n) = text.parse() {
            return Ok(n);
        }
    }
    Err(PixelGridError::Decode(format!("invalid total count {value:?}")))
}

fn parse_record(value: JsValue) -> Result<RawRecord> {
    serde_wasm_bindgen::from_value(value).map_err(|e| PixelGridError::Decode(e.to_string()))
}

fn parse_outcome(entry: &JsValue) -> RecordOutcome {
    let field = |name: &str| Reflect::get(entry, &JsValue::from_str(name)).unwrap_or(JsValue::UNDEFINED);
    match field("status").as_string().as_deref() {
        Some("success") => parse_record(field("result")),
        Some("failure") => Err(PixelGridError::Ledger(js_message(&field("error")))),
        other => Err(PixelGridError::Decode(format!("unknown batch status {other:?}"))),
    }
}

/// Best-effort text for a thrown JS value.
fn js_message(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    format!("{value:?}")
}

impl Ledger for JsLedger {
    fn total_count(&self) -> LocalBoxFuture<'_, Result<u64>> {
        async move {
            let value = self.call(GET_TOTAL_COUNT, &[]).await?;
            parse_count(&value)
        }
        .boxed_local()
    }

    fn record(&self, id: RecordId) -> LocalBoxFuture<'_, Result<RawRecord>> {
        async move {
            let value = self.call(GET_RECORD_AT, &[id_arg(id)]).await?;
            parse_record(value)
        }
        .boxed_local()
    }

    fn records(&self, ids: Vec<RecordId>) -> LocalBoxFuture<'_, Result<Vec<RecordOutcome>>> {
        async move {
            let js_ids: Array = ids.iter().map(|id| id_arg(*id)).collect();
            let value = self.call(GET_RECORDS_BATCH, &[js_ids.into()]).await?;
            let entries = value
                .dyn_into::<Array>()
                .map_err(|_| PixelGridError::Ledger("batch result is not an array".into()))?;
            Ok(entries.iter().map(|entry| parse_outcome(&entry)).collect())
        }
        .boxed_local()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use js_sys::Object;
    use wasm_bindgen_test::wasm_bindgen_test;

    fn object(fields: &[(&str, JsValue)]) -> JsValue {
        let obj = Object::new();
        for (key, value) in fields {
            Reflect::set(&obj, &JsValue::from_str(key), value).unwrap();
        }
        obj.into()
    }

    /// Three records at `(0, id)`; id 1 fails inside the batch.
    fn fake_ledger() -> JsValue {
        object(&[
            (
                GET_TOTAL_COUNT,
                Function::new_no_args("return Promise.resolve(3n);").into(),
            ),
            (
                GET_RECORD_AT,
                Function::new_with_args(
                    "id",
                    "return { packedColor: 4278190335, packedPosition: Number(id), message: 'gm' };",
                )
                .into(),
            ),
            (
                GET_RECORDS_BATCH,
                Function::new_with_args(
                    "ids",
                    "return Promise.resolve(ids.map(id => id === 1n \
                       ? { status: 'failure', error: 'reverted' } \
                       : { status: 'success', result: { packedColor: 255, packedPosition: Number(id) } }));",
                )
                .into(),
            ),
        ])
    }

    #[wasm_bindgen_test]
    fn count_accepts_numbers_and_bigints() {
        assert_eq!(parse_count(&JsValue::from_f64(42.0)).unwrap(), 42);
        assert_eq!(
            parse_count(&JsValue::bigint_from_str("12345678901")).unwrap(),
            12_345_678_901
        );
        assert!(parse_count(&JsValue::from_f64(-1.0)).is_err());
        assert!(parse_count(&JsValue::from_f64(1.5)).is_err());
        assert!(parse_count(&JsValue::from_str("7")).is_err());
    }

    #[wasm_bindgen_test]
    fn batch_entries_become_outcomes() {
        let result = object(&[
            ("packedColor", JsValue::from_f64(255.0)),
            ("packedPosition", JsValue::from_f64(65538.0)),
        ]);
        let ok = parse_outcome(&object(&[("status", "success".into()), ("result", result)])).unwrap();
        assert_eq!((ok.packed_color, ok.packed_position), (255, 65538));
        assert_eq!(ok.message, "");

        let failed = parse_outcome(&object(&[("status", "failure".into()), ("error", "reverted".into())]));
        assert_eq!(failed, Err(PixelGridError::Ledger("reverted".into())));

        let unknown = parse_outcome(&object(&[("status", "pending".into())]));
        assert!(matches!(unknown, Err(PixelGridError::Decode(_))));
    }

    #[wasm_bindgen_test]
    fn missing_methods_are_rejected() {
        let partial = object(&[(GET_TOTAL_COUNT, Function::new_no_args("return 0;").into())]);
        assert!(matches!(JsLedger::new(partial), Err(PixelGridError::Js(_))));
    }

    #[wasm_bindgen_test]
    async fn reads_through_host_object() {
        let ledger = JsLedger::new(fake_ledger()).unwrap();

        assert_eq!(ledger.total_count().await.unwrap(), 3);

        let single = ledger.record(RecordId(2)).await.unwrap();
        assert_eq!((single.packed_position, single.message.as_str()), (2, "gm"));

        let outcomes = ledger
            .records(vec![RecordId(0), RecordId(1), RecordId(2)])
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].as_ref().unwrap().packed_position, 0);
        assert!(matches!(outcomes[1], Err(PixelGridError::Ledger(_))));
        assert_eq!(outcomes[2].as_ref().unwrap().packed_color, 255);
    }
}
