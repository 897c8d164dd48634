use std::collections::HashSet;

use proptest::prelude::*;
use vectorlane_core::distance::{cosine_distance, dot_product, euclidean_distance_squared};
use vectorlane_core::{build_schema, DataType, FieldSchema, Filter, MetricType, Record};

const NAMES: [&str; 6] = ["id", "pk", "text", "subject", "score", "flag"];

/// Scalar fields drawn from a small name pool so duplicates are common,
/// plus one vector field, in random order. Primaries only land on types
/// that may be primary.
fn field_lists() -> impl Strategy<Value = Vec<FieldSchema>> {
    prop::collection::vec((0..NAMES.len(), 0..4usize, any::<bool>()), 0..6)
        .prop_map(|specs| {
            let mut fields: Vec<FieldSchema> = specs
                .into_iter()
                .map(|(name, kind, primary)| {
                    let name = NAMES[name];
                    let field = match kind {
                        0 => FieldSchema::int64(name),
                        1 => FieldSchema::varchar(name, 64),
                        2 => FieldSchema::new(name, DataType::Bool),
                        _ => FieldSchema::new(name, DataType::Double),
                    };
                    if primary && kind < 2 {
                        field.primary()
                    } else {
                        field
                    }
                })
                .collect();
            fields.push(FieldSchema::float_vector("embedding", 8));
            fields
        })
        .prop_shuffle()
}

fn comparisons() -> impl Strategy<Value = Filter> {
    (prop::sample::select(vec!["a", "b"]), 0..6usize, -50i64..50).prop_map(|(field, op, v)| {
        let f = Filter::field(field);
        match op {
            0 => f.eq(v),
            1 => f.ne(v),
            2 => f.gt(v),
            3 => f.gte(v),
            4 => f.lt(v),
            _ => f.lte(v),
        }
    })
}

fn filters() -> impl Strategy<Value = Filter> {
    comparisons().prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| l.and(r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| l.or(r)),
            inner.prop_map(Filter::negate),
        ]
    })
}

proptest! {
    #[test]
    fn test_build_schema_accepts_iff_one_primary_and_unique_names(fields in field_lists()) {
        let primaries = fields.iter().filter(|f| f.is_primary()).count();
        let mut seen = HashSet::new();
        let unique = fields.iter().all(|f| seen.insert(f.name().to_string()));

        let result = build_schema(fields);
        prop_assert_eq!(result.is_ok(), primaries == 1 && unique);
    }

    #[test]
    fn test_rendered_filter_parses_to_same_predicate(
        filter in filters(),
        a in -60i64..60,
        b in -60i64..60,
    ) {
        let record = Record::new().with_field("a", a).with_field("b", b);
        let reparsed = Filter::parse(&filter.to_string()).unwrap();
        prop_assert_eq!(reparsed.matches(&record), filter.matches(&record));
    }

    #[test]
    fn test_metrics_match_f64_reference(
        pairs in proptest::collection::vec((-1.0f32..1.0f32, -1.0f32..1.0f32), 1..100)
    ) {
        let a: Vec<f32> = pairs.iter().map(|p| p.0).collect();
        let b: Vec<f32> = pairs.iter().map(|p| p.1).collect();

        // |a - b|^2 = |a|^2 + |b|^2 - 2 a.b, accumulated in f64
        let aa: f64 = a.iter().map(|&x| f64::from(x) * f64::from(x)).sum();
        let bb: f64 = b.iter().map(|&y| f64::from(y) * f64::from(y)).sum();
        let ab: f64 = a.iter().zip(&b).map(|(&x, &y)| f64::from(x) * f64::from(y)).sum();
        let l2 = (aa + bb - 2.0 * ab).max(0.0);

        let tolerance = |reference: f64| 1e-4 * (1.0 + reference.abs());
        let got = f64::from(MetricType::L2.distance(&a, &b).unwrap());
        prop_assert!((got - l2).abs() < tolerance(l2), "l2 {} vs {}", got, l2);

        let got = f64::from(MetricType::Ip.distance(&a, &b).unwrap());
        prop_assert!((got + ab).abs() < tolerance(ab), "ip {} vs {}", got, -ab);

        if aa > 1e-6 && bb > 1e-6 {
            let cosine = 1.0 - ab / (aa.sqrt() * bb.sqrt());
            let got = f64::from(MetricType::Cosine.distance(&a, &b).unwrap());
            prop_assert!((got - cosine).abs() < 1e-4, "cosine {} vs {}", got, cosine);
        }
    }

    #[test]
    fn test_cosine_distance_in_range(
        a in proptest::collection::vec(-1.0f32..1.0f32, 1..100),
        b in proptest::collection::vec(-1.0f32..1.0f32, 1..100)
    ) {
        let len = std::cmp::min(a.len(), b.len());
        let a = &a[..len];
        let b = &b[..len];

        // Skip zero vectors to avoid NaN
        if dot_product(a, a) < 1e-6 || dot_product(b, b) < 1e-6 {
            return Ok(());
        }

        let d = cosine_distance(a, b);
        prop_assert!((-1e-4..=2.0 + 1e-4).contains(&d));
    }
}

#[test]
fn test_distances_on_worked_values() {
    let a = [1.0, 2.0, 2.0];
    let b = [4.0, 6.0, 2.0];

    // (1-4)^2 + (2-6)^2 + 0 = 25
    assert_eq!(euclidean_distance_squared(&a, &b), 25.0);
    // 4 + 12 + 4 = 20
    assert_eq!(dot_product(&a, &b), 20.0);
    assert_eq!(MetricType::Ip.distance(&a, &b), Some(-20.0));
    // |a| = 3, |b| = sqrt(56)
    let expected = 1.0 - 20.0 / (3.0 * 56f32.sqrt());
    assert!((cosine_distance(&a, &b) - expected).abs() < 1e-6);

    assert_eq!(cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]), 2.0);
    assert_eq!(cosine_distance(&[0.0, 3.0], &[0.0, 0.5]), 0.0);
}
