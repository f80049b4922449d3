use std::collections::BTreeMap;

use crate::case_base::CaseBase;
use crate::error::{CbrError, Result};
use crate::retrieval::RetrievalResult;
use crate::types::Label;

/// Majority vote over the retrieved cases.
///
/// When several labels share the highest vote count, the label of the most
/// similar neighbor among them wins. Retrieval order already puts that
/// neighbor first, so the first neighbor carrying a tied label decides.
pub fn reuse(retrieved: &RetrievalResult, case_base: &CaseBase) -> Result<Label> {
    let mut votes: BTreeMap<Label, usize> = BTreeMap::new();
    let mut labels = Vec::with_capacity(retrieved.len());
    for neighbor in retrieved.iter() {
        let case = case_base
            .get(neighbor.index)
            .ok_or(CbrError::CaseNotFound(neighbor.index))?;
        *votes.entry(case.label).or_default() += 1;
        labels.push(case.label);
    }
    let top = votes.values().copied().max().ok_or(CbrError::EmptyRetrieval)?;
    labels
        .into_iter()
        .find(|label| votes.get(label) == Some(&top))
        .ok_or(CbrError::EmptyRetrieval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Neighbor, Record, Value};

    fn base(labels: &[&str]) -> CaseBase {
        let records: Vec<Record> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| {
                Record::from([
                    ("x".to_string(), Value::Number(i as f64)),
                    ("income".to_string(), Value::from(*l)),
                ])
            })
            .collect();
        CaseBase::from_records(&records, "income").unwrap()
    }

    fn result(pairs: &[(usize, f64)]) -> RetrievalResult {
        RetrievalResult {
            neighbors: pairs
                .iter()
                .map(|&(index, similarity)| Neighbor { index, similarity })
                .collect(),
        }
    }

    #[test]
    fn majority_wins() {
        let cb = base(&[">50K", "<=50K", "<=50K"]);
        let r = result(&[(0, 0.9), (1, 0.8), (2, 0.7)]);
        assert_eq!(reuse(&r, &cb).unwrap(), Label::AtOrBelow);
    }

    #[test]
    fn tie_goes_to_most_similar() {
        let cb = base(&[">50K", "<=50K", "<=50K", ">50K"]);
        let r = result(&[(1, 0.95), (0, 0.9), (3, 0.6), (2, 0.5)]);
        assert_eq!(reuse(&r, &cb).unwrap(), Label::AtOrBelow);
        let r = result(&[(3, 0.95), (2, 0.9)]);
        assert_eq!(reuse(&r, &cb).unwrap(), Label::Above);
    }

    #[test]
    fn empty_result_is_an_error() {
        let cb = base(&[">50K"]);
        assert_eq!(
            reuse(&RetrievalResult::default(), &cb),
            Err(CbrError::EmptyRetrieval)
        );
    }
}
