use anyhow::Result;
use cbr::{leave_one_out, sweep, CaseBase, CbrError, Config, Label, Record, Value, Weights};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

fn case(x: f64, c: &str, income: &str) -> Record {
    Record::from([
        ("x".to_string(), Value::Number(x)),
        ("c".to_string(), Value::from(c)),
        ("income".to_string(), Value::from(income)),
    ])
}

fn config(k: usize, workers: usize) -> Config {
    Config {
        k,
        workers,
        ..Config::default()
    }
}

/// Two well separated clusters of six cases. Cluster "a" is mostly >50K with
/// one noisy <=50K case at x = 2; cluster "b" is uniformly <=50K.
fn clusters() -> Result<CaseBase> {
    let mut records = Vec::new();
    for x in 0..6 {
        let income = if x == 2 { "<=50K" } else { ">50K" };
        records.push(case(x as f64, "a", income));
    }
    for x in 100..106 {
        records.push(case(x as f64, "b", "<=50K"));
    }
    Ok(CaseBase::from_records(&records, "income")?)
}

fn synthetic(n: usize, seed: u64) -> Result<CaseBase> {
    let mut rng = Pcg64::seed_from_u64(seed);
    let colors = ["red", "green", "blue"];
    let records: Vec<Record> = (0..n)
        .map(|_| {
            let x: f64 = rng.gen_range(0.0..100.0);
            let c = colors[rng.gen_range(0..colors.len())];
            let income = if x + rng.gen_range(-20.0..20.0) > 50.0 { ">50K" } else { "<=50K" };
            case(x, c, income)
        })
        .collect();
    Ok(CaseBase::from_records(&records, "income")?)
}

#[test]
fn identical_cases_with_opposite_labels() -> Result<()> {
    let records = vec![case(1.0, "a", ">50K"), case(1.0, "a", "<=50K")];
    let cb = CaseBase::from_records(&records, "income")?;
    let evaluation = leave_one_out(&cb, &config(1, 2))?;
    assert_eq!(evaluation.correct_count, 0);
    assert_eq!(evaluation.total_count, 2);
    assert_eq!(evaluation.accuracy(), 0.0);
    Ok(())
}

#[test]
fn accuracy_does_not_depend_on_workers() -> Result<()> {
    let cb = synthetic(200, 11)?;
    let sequential = leave_one_out(&cb, &config(5, 1))?;
    for workers in [2, 4, 8] {
        let parallel = leave_one_out(&cb, &config(5, workers))?;
        assert_eq!(parallel.correct_count, sequential.correct_count);
        assert_eq!(parallel.outcomes, sequential.outcomes);
    }
    assert_eq!(sequential.total_count, 200);
    Ok(())
}

#[test]
fn larger_k_smooths_out_noise() -> Result<()> {
    let cb = clusters()?;
    let k1 = leave_one_out(&cb, &config(1, 4))?;
    let k5 = leave_one_out(&cb, &config(5, 4))?;
    assert_eq!(k1.correct_count, 10);
    assert_eq!(k5.correct_count, 11);
    assert!(k5.accuracy() >= k1.accuracy());

    let wrong: Vec<usize> = k5
        .outcomes
        .iter()
        .filter(|o| !o.correct())
        .map(|o| o.index)
        .collect();
    assert_eq!(wrong, vec![2]);
    assert_eq!(k5.outcomes[2].predicted, Label::Above);
    Ok(())
}

#[test]
fn k_must_fit_the_case_base() -> Result<()> {
    let cb = clusters()?;
    let err = leave_one_out(&cb, &config(12, 2)).unwrap_err();
    assert_eq!(err, CbrError::InsufficientCaseBase { k: 12, available: 11 });
    assert!(leave_one_out(&cb, &config(11, 2)).is_ok());
    assert!(leave_one_out(&cb, &config(0, 2)).is_err());
    Ok(())
}

#[test]
fn sample_limits_queries() -> Result<()> {
    let cb = synthetic(60, 3)?;
    let evaluation = leave_one_out(
        &cb,
        &Config {
            sample: Some(25),
            ..config(3, 4)
        },
    )?;
    assert_eq!(evaluation.total_count, 25);
    assert_eq!(evaluation.outcomes.last().map(|o| o.index), Some(24));
    Ok(())
}

#[test]
fn sweep_keeps_config_order() -> Result<()> {
    let cb = synthetic(80, 5)?;
    let configs = vec![
        config(1, 2),
        Config {
            weights: Weights::uniform().with("x", 3.0),
            ..config(5, 2)
        },
        config(9, 2),
    ];
    let results = sweep(&cb, &configs)?;
    assert_eq!(results.iter().map(|e| e.k).collect::<Vec<_>>(), vec![1, 5, 9]);
    assert!(results[1].weighted);
    for (result, config) in results.iter().zip(&configs) {
        assert_eq!(result, &leave_one_out(&cb, config)?);
    }
    Ok(())
}

#[test]
fn empty_sample_is_rejected() -> Result<()> {
    let cb = synthetic(20, 9)?;
    let err = leave_one_out(
        &cb,
        &Config {
            sample: Some(0),
            ..config(3, 2)
        },
    )
    .unwrap_err();
    assert!(matches!(err, CbrError::InvalidConfig(_)));
    Ok(())
}

#[test]
fn equal_weights_are_not_reported_as_weighted() -> Result<()> {
    let cb = synthetic(30, 13)?;
    let doubled = Config {
        weights: Weights::uniform().with("x", 2.0).with("c", 2.0),
        ..config(3, 2)
    };
    let evaluation = leave_one_out(&cb, &doubled)?;
    assert!(!evaluation.weighted);
    assert_eq!(evaluation, leave_one_out(&cb, &config(3, 2))?);
    Ok(())
}
