/// Untyped table returned by one driver read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Nonzero means the meter rejected the read; rows are then meaningless.
    pub error_code: i32,
    pub error_message: String,
    /// Column labels as the meter reports them, usually register codes.
    pub column_labels: Vec<String>,
    /// One entry per captured row, each as long as `column_labels`.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(column_labels: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            error_code: 0,
            error_message: String::new(),
            column_labels,
            rows,
        }
    }

    pub fn failed(error_code: i32, error_message: impl Into<String>) -> Self {
        Self {
            error_code,
            error_message: error_message.into(),
            ..Default::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error_code == 0
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.column_labels.len()
    }
}
