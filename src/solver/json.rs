#![allow(non_snake_case)]

use crate::{
    algebra::*,
    solver::{FactorInfo, SolverSettings},
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::io::Write;
use std::{fs::File, io, io::Read};

/// Reading and writing of solver data as JSON files.
pub trait SolverJSONReadWrite: Sized {
    fn write_to_file(&self, file: &mut File) -> Result<(), io::Error>;
    fn read_from_file(file: &mut File) -> Result<Self, io::Error>;
}

/// A linear system `A·x = b` together with the settings to solve it with.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(bound = "T: Serialize + DeserializeOwned")]
pub struct JsonLinearSystem<T: FloatT> {
    pub A: CscMatrix<T>,
    pub b: Vec<T>,
    pub settings: SolverSettings<T>,
}

fn write_json<S: Serialize>(data: &S, file: &mut File) -> Result<(), io::Error> {
    let json = serde_json::to_string(data)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

fn read_json<S: DeserializeOwned>(file: &mut File) -> Result<S, io::Error> {
    let mut buffer = String::new();
    file.read_to_string(&mut buffer)?;
    Ok(serde_json::from_str(&buffer)?)
}

fn invalid_data<E: std::error::Error + Send + Sync + 'static>(e: E) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}

impl<T> SolverJSONReadWrite for SolverSettings<T>
where
    T: FloatT + DeserializeOwned + Serialize,
{
    fn write_to_file(&self, file: &mut File) -> Result<(), io::Error> {
        write_json(self, file)
    }

    /// Settings are validated after loading.
    fn read_from_file(file: &mut File) -> Result<Self, io::Error> {
        let settings: SolverSettings<T> = read_json(file)?;
        settings.validate().map_err(invalid_data)?;
        Ok(settings)
    }
}

impl SolverJSONReadWrite for FactorInfo {
    fn write_to_file(&self, file: &mut File) -> Result<(), io::Error> {
        write_json(self, file)
    }

    fn read_from_file(file: &mut File) -> Result<Self, io::Error> {
        read_json(file)
    }
}

impl<T> SolverJSONReadWrite for JsonLinearSystem<T>
where
    T: FloatT + DeserializeOwned + Serialize,
{
    fn write_to_file(&self, file: &mut File) -> Result<(), io::Error> {
        write_json(self, file)
    }

    /// The matrix format, the right hand side length and the settings are
    /// checked after loading.
    fn read_from_file(file: &mut File) -> Result<Self, io::Error> {
        let system: JsonLinearSystem<T> = read_json(file)?;
        system.A.check_format().map_err(invalid_data)?;
        if system.b.len() != system.A.m {
            return Err(invalid_data(SparseFormatError::IncompatibleDimension));
        }
        system.settings.validate().map_err(invalid_data)?;
        Ok(system)
    }
}

#[test]
fn test_json_io() {
    use crate::solver::SolverSettingsBuilder;
    use std::io::{Seek, SeekFrom};

    let settings = SolverSettingsBuilder::<f64>::default()
        .ordering("degree".to_string())
        .perm(vec![1, 0])
        .max_threads(3u32)
        .build()
        .unwrap();

    let mut file = tempfile::tempfile().unwrap();
    settings.write_to_file(&mut file).unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();
    let loaded = SolverSettings::<f64>::read_from_file(&mut file).unwrap();
    assert_eq!(settings, loaded);

    // unknown ordering is rejected on load
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(br#"{"ordering": "metis"}"#).unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();
    let err = SolverSettings::<f64>::read_from_file(&mut file).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
}
