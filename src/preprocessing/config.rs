//! Preprocessing configuration

use serde::{Deserialize, Serialize};

/// Column wiring for the six-stage churn preprocessing chain
///
/// Defaults carry the seller-churn ABT layout; tests and other datasets
/// override through the builder methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Label substituted for missing categorical values
    pub sentinel_label: String,

    /// High-cardinality columns replaced by train-time target means
    pub mean_encode_columns: Vec<String>,

    /// Low-cardinality column expanded into 0/1 indicators
    pub onehot_column: String,

    /// Drop the last one-hot level to avoid a redundant indicator
    pub onehot_drop_last: bool,

    /// Numeric columns whose missing values mean "no observation" (fill 999)
    pub fill_999_columns: Vec<String>,

    /// Numeric columns whose missing values mean "zero activity" (fill 0)
    pub fill_0_columns: Vec<String>,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            sentinel_label: "Faltante".to_string(),
            mean_encode_columns: vec![
                "descCidade".to_string(),
                "descTopCategoria".to_string(),
                "descTopEstado".to_string(),
            ],
            onehot_column: "descEstado".to_string(),
            onehot_drop_last: true,
            fill_999_columns: vec![
                "avgTempoResposta1M".to_string(),
                "avgTempoResposta3M".to_string(),
                "qtDiasMediaEntregaPrevista".to_string(),
                "qtMediaDiasEntreVendas".to_string(),
                "qtMediaDiasEntregaDespacho".to_string(),
                "qtRazaoPedidoMesVsMes1".to_string(),
                "qtRazaoReceitaMesVsMedia".to_string(),
                "qtRazaoReceitaMesVsMes1".to_string(),
                "vlTempoMedioAvaliacao".to_string(),
                "vlTempoMedioAvaliacao1M".to_string(),
                "vlTempoMedioAvaliacao3M".to_string(),
            ],
            fill_0_columns: vec![
                "avgTempoResposta".to_string(),
                "pctMensagem".to_string(),
                "pctMensagem1M".to_string(),
                "pctMensagem3M".to_string(),
                "qtMediaFotos".to_string(),
                "vlMedioPeso".to_string(),
                "vlMedioTamanhoNome".to_string(),
                "vlMedioVolume".to_string(),
                "vlMedioVolume1M".to_string(),
                "vlMedioVolume3M".to_string(),
            ],
        }
    }
}

impl PreprocessingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sentinel_label(mut self, label: impl Into<String>) -> Self {
        self.sentinel_label = label.into();
        self
    }

    pub fn with_mean_encode_columns(mut self, columns: Vec<String>) -> Self {
        self.mean_encode_columns = columns;
        self
    }

    pub fn with_onehot_column(mut self, column: impl Into<String>) -> Self {
        self.onehot_column = column.into();
        self
    }

    pub fn with_fill_999_columns(mut self, columns: Vec<String>) -> Self {
        self.fill_999_columns = columns;
        self
    }

    pub fn with_fill_0_columns(mut self, columns: Vec<String>) -> Self {
        self.fill_0_columns = columns;
        self
    }

    /// Every column this chain touches beyond the plain categorical fill
    pub fn declared_columns(&self) -> Vec<String> {
        let mut cols = self.mean_encode_columns.clone();
        cols.push(self.onehot_column.clone());
        cols.extend(self.fill_999_columns.iter().cloned());
        cols.extend(self.fill_0_columns.iter().cloned());
        cols
    }
}
