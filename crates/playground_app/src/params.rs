//! Captured parameter values.
//!
//! A [`Params`] is the ordered name→value mapping read from a route card's
//! inputs. It becomes the request payload (structured or multipart), and,
//! without its file values, the `data` half of the fragment state.

use playground_client::{FileUpload, FormPayload, FormValue, Payload};
use serde_json::{Map, Value};

/// One captured input value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Text(String),
    File(FileUpload),
}

impl ParamValue {
    /// JavaScript-style truthiness of the value
    pub fn is_truthy(&self) -> bool {
        match self {
            ParamValue::Bool(b) => *b,
            ParamValue::Text(s) => !s.is_empty(),
            ParamValue::File(_) => true,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, ParamValue::File(_))
    }

    /// Structured form; files are represented by their name
    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Bool(b) => Value::Bool(*b),
            ParamValue::Text(s) => Value::String(s.clone()),
            ParamValue::File(file) => Value::String(file.file_name.clone()),
        }
    }

    /// Value of a JSON entry restored from link state
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Bool(b) => ParamValue::Bool(*b),
            Value::String(s) => ParamValue::Text(s.clone()),
            Value::Null => ParamValue::Text(String::new()),
            other => ParamValue::Text(other.to_string()),
        }
    }

    fn into_form_value(self) -> FormValue {
        match self {
            ParamValue::Bool(b) => FormValue::Text(b.to_string()),
            ParamValue::Text(s) => FormValue::Text(s),
            ParamValue::File(file) => FormValue::File(file),
        }
    }
}

/// Ordered name→value mapping captured from a card
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name`, replacing an existing entry in place
    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Params restored from a JSON object
    pub fn from_json(data: &Map<String, Value>) -> Self {
        Self {
            entries: data
                .iter()
                .map(|(k, v)| (k.clone(), ParamValue::from_json(v)))
                .collect(),
        }
    }

    /// Everything except file values, for link state
    pub fn to_fragment_data(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .filter(|(_, v)| !v.is_file())
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }

    /// Request payload: multipart when the route has form fields
    pub fn into_payload(self, form: bool) -> Payload {
        if form {
            let mut payload = FormPayload::new();
            for (name, value) in self.entries {
                payload.append(name, value.into_form_value());
            }
            Payload::Form(payload)
        } else {
            Payload::Json(
                self.entries
                    .into_iter()
                    .map(|(k, v)| (k, v.to_json()))
                    .collect(),
            )
        }
    }
}

impl FromIterator<(String, ParamValue)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Params {
        [
            ("label".to_string(), ParamValue::Text("hi".to_string())),
            ("flag".to_string(), ParamValue::Bool(false)),
            (
                "file".to_string(),
                ParamValue::File(FileUpload::new("a.zip", "PK")),
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_fragment_data_excludes_files() {
        let data = sample().to_fragment_data();
        assert_eq!(Value::Object(data), json!({ "label": "hi", "flag": false }));
    }

    #[test]
    fn test_json_payload_keeps_order() {
        let mut params = Params::new();
        params.insert("q", ParamValue::Text("hi".to_string()));
        params.insert("n", ParamValue::Text("5".to_string()));

        let Payload::Json(map) = params.into_payload(false) else {
            panic!("expected json payload");
        };
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, vec!["q", "n"]);
    }

    #[test]
    fn test_form_payload_carries_files() {
        let Payload::Form(form) = sample().into_payload(true) else {
            panic!("expected form payload");
        };
        assert_eq!(form.parts().len(), 3);
        assert_eq!(form.parts()[1].1, FormValue::Text("false".to_string()));
        assert!(matches!(form.parts()[2].1, FormValue::File(ref f) if f.file_name == "a.zip"));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut params = sample();
        params.insert("label", ParamValue::Text("bye".to_string()));
        assert_eq!(params.len(), 3);
        assert_eq!(params.get("label"), Some(&ParamValue::Text("bye".to_string())));
    }

    #[test]
    fn test_from_json() {
        let data = json!({ "a": "1", "b": true, "c": 5, "d": null });
        let params = Params::from_json(data.as_object().unwrap());
        assert_eq!(params.get("a"), Some(&ParamValue::Text("1".to_string())));
        assert_eq!(params.get("b"), Some(&ParamValue::Bool(true)));
        assert_eq!(params.get("c"), Some(&ParamValue::Text("5".to_string())));
        assert_eq!(params.get("d"), Some(&ParamValue::Text(String::new())));
    }

    #[test]
    fn test_truthiness() {
        assert!(!ParamValue::Bool(false).is_truthy());
        assert!(!ParamValue::Text(String::new()).is_truthy());
        assert!(ParamValue::Text("0".to_string()).is_truthy());
    }
}
