//! Property-based tests for input conversion and request parsing
//!
//! Uses proptest to check that typed conversion agrees with the standard
//! numeric parsers and that argument order never depends on input order.

use proptest::prelude::*;
use sqlmetrics::api::metrics_http::{extract_inputs, parse_names};
use sqlmetrics::engine::{bind_parameters, convert_value};
use sqlmetrics::gateway::ParameterValue;
use sqlmetrics::schema::{MetricDefinition, ParameterDeclaration, ParameterType};
use sqlmetrics::{Error, ErrorKind};
use std::collections::HashMap;

/// Lowercase words that no numeric parser accepts (no `inf`, `nan`, hex digits)
fn non_numeric() -> impl Strategy<Value = String> {
    "[g-z]{1,12}"
}

fn parameter_type() -> impl Strategy<Value = ParameterType> {
    prop_oneof![
        Just(ParameterType::String),
        Just(ParameterType::Integer),
        Just(ParameterType::Float),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: every i64 survives conversion through its decimal text
    #[test]
    fn integer_conversion_matches_parse(n in any::<i64>()) {
        let converted = convert_value(&n.to_string(), ParameterType::Integer);
        prop_assert_eq!(converted, Some(ParameterValue::Integer(n)));
    }

    /// Property: float conversion agrees with `str::parse::<f64>`
    #[test]
    fn float_conversion_matches_parse(x in any::<f64>().prop_filter("finite", |x| x.is_finite())) {
        let text = x.to_string();
        let converted = convert_value(&text, ParameterType::Float);
        prop_assert_eq!(converted, Some(ParameterValue::Float(text.parse::<f64>().unwrap())));
    }

    /// Property: integers are also valid floats
    #[test]
    fn integers_are_valid_floats(n in -1_000_000i64..1_000_000) {
        let converted = convert_value(&n.to_string(), ParameterType::Float);
        prop_assert_eq!(converted, Some(ParameterValue::Float(n as f64)));
    }

    /// Property: non-numeric text fails numeric conversion but passes as a string
    #[test]
    fn non_numeric_text_only_converts_as_string(raw in non_numeric()) {
        prop_assert_eq!(convert_value(&raw, ParameterType::Integer), None);
        prop_assert_eq!(convert_value(&raw, ParameterType::Float), None);
        prop_assert_eq!(
            convert_value(&raw, ParameterType::String),
            Some(ParameterValue::Text(raw.clone()))
        );
    }

    /// Property: arguments follow declaration order no matter how inputs were supplied
    #[test]
    fn bound_arguments_follow_declaration_order(
        kinds in prop::collection::vec(parameter_type(), 1..8),
        seed in any::<u64>(),
    ) {
        let mut metric = MetricDefinition::scalar("m", "SELECT 1");
        let mut pairs = Vec::new();
        for (i, kind) in kinds.iter().enumerate() {
            let name = format!("p{i}");
            metric = metric.with_parameter(ParameterDeclaration::required(name.clone(), *kind));
            pairs.push((name, i.to_string()));
        }

        // Reverse or rotate the insertion order; HashMap order is irrelevant anyway.
        if seed % 2 == 0 {
            pairs.reverse();
        } else {
            let len = pairs.len();
            pairs.rotate_left((seed as usize) % len);
        }
        let inputs: HashMap<String, String> = pairs.into_iter().collect();

        let args = bind_parameters(&metric, &inputs).unwrap();
        prop_assert_eq!(args.len(), kinds.len());
        for (i, (arg, kind)) in args.iter().zip(&kinds).enumerate() {
            let expected = match kind {
                ParameterType::String => ParameterValue::Text(i.to_string()),
                ParameterType::Integer => ParameterValue::Integer(i as i64),
                ParameterType::Float => ParameterValue::Float(i as f64),
            };
            prop_assert_eq!(arg, &expected);
        }
    }

    /// Property: a bad value is always reported as an invalid request naming the parameter
    #[test]
    fn bad_numeric_input_names_parameter(raw in non_numeric()) {
        let metric = MetricDefinition::scalar("m", "SELECT ?")
            .with_parameter(ParameterDeclaration::required("limit", ParameterType::Integer));
        let inputs = HashMap::from([("limit".to_string(), raw.clone())]);

        let err = bind_parameters(&metric, &inputs).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        let is_conversion = matches!(
            err,
            Error::ParameterConversion { ref param, raw: ref got, .. } if param == "limit" && *got == raw
        );
        prop_assert!(is_conversion);
    }

    /// Property: parsed names are never empty and never padded
    #[test]
    fn parsed_names_are_trimmed_and_non_empty(raw in "[a-c ,]{0,30}") {
        for name in parse_names(&raw) {
            prop_assert!(!name.is_empty());
            prop_assert_eq!(name.trim(), name.as_str());
            prop_assert!(!name.contains(','));
        }
    }

    /// Property: `names` never leaks into metric inputs, and the first value wins
    #[test]
    fn extracted_inputs_skip_names_and_keep_first(
        keys in prop::collection::vec("[a-d]|names", 0..12),
    ) {
        let pairs: Vec<(String, String)> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i.to_string()))
            .collect();

        let inputs = extract_inputs(&pairs);
        prop_assert!(!inputs.contains_key("names"));
        for (key, value) in &inputs {
            let first = pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v);
            prop_assert_eq!(Some(value), first);
        }
    }
}
