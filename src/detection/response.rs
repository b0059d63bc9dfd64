use crate::detection::types::{Detection, DetectionResponse};
use crate::errors::{LensError, LensResult};

/// Parse a `/detect` reply body.
///
/// A JSON object without `detections` (or with `detections: null`) is an
/// empty result. Anything that is not a JSON object, or a `detections`
/// value that does not match the expected shape, is rejected as a whole.
pub fn parse_detection_response(body: &str) -> LensResult<DetectionResponse> {
    let json: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| LensError::MalformedResponse(format!("body is not JSON: {e}")))?;

    let Some(obj) = json.as_object() else {
        return Err(LensError::MalformedResponse(format!(
            "expected a JSON object, got {}",
            json_kind(&json)
        )));
    };

    let detections = match obj.get("detections") {
        None | Some(serde_json::Value::Null) => {
            tracing::debug!("response has no `detections` field; treating as empty");
            Vec::new()
        }
        Some(value) => serde_json::from_value::<Vec<Detection>>(value.clone())
            .map_err(|e| LensError::MalformedResponse(format!("bad `detections`: {e}")))?,
    };

    Ok(DetectionResponse { detections })
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_in_wire_order() {
        let body = r#"{"detections":[
            {"class":"dog","confidence":0.91,"bbox":{"x1":1,"y1":2,"x2":30,"y2":40}},
            {"class":"cat","confidence":0.35,"bbox":{"x1":5,"y1":6,"x2":7,"y2":8}}
        ]}"#;
        let resp = parse_detection_response(body).unwrap();
        let classes: Vec<_> = resp.detections.iter().map(|d| d.class_name.as_str()).collect();
        assert_eq!(classes, vec!["dog", "cat"]);
        assert_eq!(resp.detections[0].bbox.x2, 30.0);
    }

    #[test]
    fn missing_detections_is_empty_not_error() {
        let resp = parse_detection_response(r#"{"model":"yolo"}"#).unwrap();
        assert!(resp.is_empty());
        let resp = parse_detection_response(r#"{"detections":null}"#).unwrap();
        assert!(resp.is_empty());
    }

    #[test]
    fn empty_list_is_valid() {
        let resp = parse_detection_response(r#"{"detections":[]}"#).unwrap();
        assert!(resp.is_empty());
    }

    #[test]
    fn non_object_is_malformed() {
        for body in ["[]", "42", "\"ok\"", "null", "<html>"] {
            assert!(
                matches!(parse_detection_response(body), Err(LensError::MalformedResponse(_))),
                "{body}"
            );
        }
    }

    #[test]
    fn bad_entry_rejects_everything() {
        let body = r#"{"detections":[
            {"class":"dog","confidence":0.9,"bbox":{"x1":1,"y1":2,"x2":3,"y2":4}},
            {"class":"cat","confidence":"high"}
        ]}"#;
        assert!(matches!(
            parse_detection_response(body),
            Err(LensError::MalformedResponse(_))
        ));
    }
}
