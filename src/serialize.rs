use rulinalg::matrix::{BaseMatrix, Matrix};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// On-disk shape of a matrix. Values are stored as their u64 bit patterns so that a round
/// trip reproduces them exactly.
#[derive(Serialize, Deserialize)]
struct MatrixRepr {
    rows: usize,
    cols: usize,
    data: Vec<u64>,
}

pub fn serialize_matrix<S: Serializer>(
    matrix: &Matrix<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    MatrixRepr {
        rows: matrix.rows(),
        cols: matrix.cols(),
        data: matrix.data().iter().map(|&f| f64::to_bits(f)).collect(),
    }
    .serialize(serializer)
}

pub fn deserialize_matrix<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Matrix<f64>, D::Error> {
    let MatrixRepr { rows, cols, data } = MatrixRepr::deserialize(deserializer)?;
    if rows.checked_mul(cols) != Some(data.len()) {
        return Err(de::Error::custom(format!(
            "matrix declared {rows}x{cols} but holds {} values",
            data.len()
        )));
    }

    Ok(Matrix::new(
        rows,
        cols,
        data.into_iter().map(f64::from_bits).collect::<Vec<_>>(),
    ))
}
