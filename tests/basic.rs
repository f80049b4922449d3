use anyhow::Result;
use cbr::{
    global_similarity, local_similarity, AttributeKind, CaseBase, Config, Label, Range, Record,
    Value, Weights,
};

fn person(age: f64, workclass: &str, hours: Option<f64>, income: &str) -> Record {
    let mut r = Record::new();
    r.insert("age".into(), Value::Number(age));
    r.insert("workclass".into(), Value::from(workclass));
    if let Some(h) = hours {
        r.insert("hours_per_week".into(), Value::Number(h));
    }
    r.insert("income".into(), Value::from(income));
    r
}

fn people() -> Vec<Record> {
    vec![
        person(25.0, "Private", Some(40.0), "<=50K"),
        person(38.0, "Self-emp", Some(50.0), ">50K"),
        person(28.0, "Private", None, "<=50K"),
        person(44.0, "Local-gov", Some(60.0), ">50K"),
        person(18.0, "Private", Some(20.0), "<=50K"),
        person(90.0, "Self-emp", Some(99.0), ">50K"),
    ]
}

#[test]
fn numeric_self_similarity() -> Result<()> {
    let range = Some(Range::new(18.0, 90.0));
    for a in [18.0, 19.5, 47.0, 90.0] {
        let s = local_similarity(AttributeKind::Numeric, &Value::Number(a), &Value::Number(a), range)?;
        assert_eq!(s, 1.0);
    }
    Ok(())
}

#[test]
fn categorical_equality() -> Result<()> {
    let values = ["Private", "Self-emp", "Local-gov"];
    for a in values {
        for b in values {
            let s = local_similarity(AttributeKind::Categorical, &a.into(), &b.into(), None)?;
            assert_eq!(s, if a == b { 1.0 } else { 0.0 });
        }
    }
    Ok(())
}

#[test]
fn global_similarity_is_symmetric_and_bounded() -> Result<()> {
    let cb = CaseBase::from_records(&people(), "income")?;
    for weights in [Weights::uniform(), Weights::income().with("workclass", 3.0)] {
        let weights = Weights::from_map(
            weights
                .overrides
                .into_iter()
                .filter(|(name, _)| cb.schema().position(name).is_some())
                .collect(),
        )
        .resolve(cb.schema())?;
        for x in cb.cases() {
            for y in cb.cases() {
                let xy = global_similarity(&x.problem, &y.problem, cb.schema(), &weights)?;
                let yx = global_similarity(&y.problem, &x.problem, cb.schema(), &weights)?;
                assert_eq!(xy, yx);
                assert!((0.0..=1.0).contains(&xy));
            }
        }
    }
    Ok(())
}

#[test]
fn classify_new_record() -> Result<()> {
    let cb = CaseBase::from_records(&people(), "income")?;
    let mut query = person(40.0, "Self-emp", Some(55.0), ">50K");
    query.remove("income");
    let result = cb.classify(&query, &Config::with_k(3))?;
    assert_eq!(result.neighbors.len(), 3);
    assert_eq!(result.neighbors.neighbors[0].index, 1);
    assert_eq!(result.label, Label::Above);

    let breakdown = cb.explain(&query, 1, &Config::with_k(3))?;
    assert_eq!(breakdown.attributes.len(), 3);
    assert_eq!(breakdown.global, Some(result.neighbors.neighbors[0].similarity));
    Ok(())
}

#[test]
fn query_out_of_range_is_clamped() -> Result<()> {
    let cb = CaseBase::from_records(&people(), "income")?;
    let mut query = Record::new();
    query.insert("age".into(), Value::Number(150.0));
    let result = cb.classify(&query, &Config::with_k(1))?;
    assert_eq!(result.neighbors.neighbors[0].index, 5);
    assert_eq!(result.neighbors.neighbors[0].similarity, 1.0);
    Ok(())
}

#[test]
fn invalid_labels_are_rejected() {
    let mut records = people();
    records[2].insert("income".into(), Value::from("rich"));
    let err = CaseBase::from_records(&records, "income").err().unwrap();
    assert!(err.to_string().contains("rich"));

    records[2].remove("income");
    let err = CaseBase::from_records(&records, "income").err().unwrap();
    assert_eq!(err, cbr::CbrError::MissingLabel { index: 2 });
}
