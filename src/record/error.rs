use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Field {field} is {actual} bytes, maximum is {max}")]
    FieldTooLong {
        field: &'static str,
        actual: usize,
        max: usize,
    },
}

pub type RecordResult<T> = Result<T, RecordError>;
