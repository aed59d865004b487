use crate::domain::payment::PaymentInstruction;
use crate::error::{BillingError, Result};
use std::io::Read;

/// Reads payment instructions from a CSV source.
///
/// Expects the columns `reference, discount, value, amount`. Whitespace is trimmed
/// and trailing empty columns may be omitted.
pub struct InstructionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> InstructionReader<R> {
    /// Creates a new `InstructionReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes instructions.
    ///
    /// A malformed row yields an error without ending the iteration.
    pub fn instructions(self) -> impl Iterator<Item = Result<PaymentInstruction>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(BillingError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = "reference, discount, value, amount\n\
                    CAL-1, 10, , \n\
                    CAL-2, custom, 12.5, 875\n\
                    CAL-3";
        let reader = InstructionReader::new(data.as_bytes());
        let results: Vec<Result<PaymentInstruction>> = reader.instructions().collect();

        assert_eq!(results.len(), 3);
        let first = results[0].as_ref().unwrap();
        assert_eq!(first.reference, "CAL-1");
        assert_eq!(first.discount.as_deref(), Some("10"));
        assert_eq!(first.value, None);
        assert_eq!(first.amount, None);

        let second = results[1].as_ref().unwrap();
        assert_eq!(second.value.as_deref(), Some("12.5"));
        assert_eq!(second.amount, Some(dec!(875)));

        let third = results[2].as_ref().unwrap();
        assert_eq!(third.reference, "CAL-3");
        assert_eq!(third.discount, None);
    }

    #[test]
    fn test_reader_malformed_amount() {
        let data = "reference, discount, value, amount\nCAL-1, N/A, , lots\nCAL-2, N/A, , 5";
        let reader = InstructionReader::new(data.as_bytes());
        let results: Vec<Result<PaymentInstruction>> = reader.instructions().collect();

        assert!(results[0].is_err());
        assert!(results[1].is_ok());
    }
}
