use std::collections::HashMap;

/// One-hot encoder over a closed vocabulary.
///
/// Multi-valued inputs (a record's list of work-type tags) are encoded
/// independently and summed element-wise into a single vector, which is
/// how multi-label categorical features fold into one embedding.
#[derive(Debug, Clone)]
pub struct CategoricalEncoder {
    vocabulary: Vec<String>,
    index: HashMap<String, usize>,
}

impl CategoricalEncoder {
    pub fn new<I, S>(vocabulary: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let vocabulary: Vec<String> = vocabulary.into_iter().map(Into::into).collect();
        let index = vocabulary
            .iter()
            .enumerate()
            .map(|(i, value)| (value.clone(), i))
            .collect();
        Self { vocabulary, index }
    }

    pub fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    /// Encode a list of values against the vocabulary. The vocabulary is
    /// closed: a value outside it is an error, reported with the value so
    /// the caller can surface which record was malformed.
    pub fn encode(&self, values: &[String]) -> Result<Vec<f32>, String> {
        let mut vector = vec![0.0f32; self.vocabulary.len()];
        for value in values {
            let idx = self.index.get(value).ok_or_else(|| value.clone())?;
            vector[*idx] += 1.0;
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WORK_TYPE_VOCABULARY;

    fn encoder() -> CategoricalEncoder {
        CategoricalEncoder::new(WORK_TYPE_VOCABULARY)
    }

    #[test]
    fn encodes_single_value_as_one_hot() {
        let enc = encoder();
        let vector = enc.encode(&["FULL_TIME".to_string()]).unwrap();
        assert_eq!(vector.iter().sum::<f32>(), 1.0);
        assert_eq!(vector[1], 1.0);
    }

    #[test]
    fn sums_multi_valued_inputs_elementwise() {
        let enc = encoder();
        let vector = enc
            .encode(&["FULL_TIME".to_string(), "REMOTE".to_string()])
            .unwrap();
        assert_eq!(vector.iter().sum::<f32>(), 2.0);
        assert_eq!(vector[1], 1.0);
        assert_eq!(vector[4], 1.0);
    }

    #[test]
    fn repeated_values_accumulate() {
        let enc = encoder();
        let vector = enc
            .encode(&["REMOTE".to_string(), "REMOTE".to_string()])
            .unwrap();
        assert_eq!(vector[4], 2.0);
    }

    #[test]
    fn unknown_value_is_an_error() {
        let enc = encoder();
        let err = enc.encode(&["FOUR_DAY_WEEK".to_string()]).unwrap_err();
        assert_eq!(err, "FOUR_DAY_WEEK");
    }

    #[test]
    fn empty_input_encodes_to_zero_vector() {
        let enc = encoder();
        let vector = enc.encode(&[]).unwrap();
        assert!(vector.iter().all(|v| *v == 0.0));
        assert_eq!(vector.len(), WORK_TYPE_VOCABULARY.len());
    }
}
