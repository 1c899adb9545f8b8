use crate::algebra::*;
use crate::solver::SettingsError;
use derive_builder::Builder;

#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Settings shared by every direct solver backend.
///
/// Construct with [`SolverSettingsBuilder`], which fills in defaults and
/// validates string-selected options:
///
/// ```no_run
/// use multifrontal::solver::SolverSettingsBuilder;
///
/// let settings = SolverSettingsBuilder::<f64>::default()
///     .ordering("degree".to_string())
///     .max_threads(4u32)
///     .build()
///     .unwrap();
/// ```

#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = "T: Serialize + DeserializeOwned"))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SolverSettings<T: FloatT> {
    ///direct solve method ("multifrontal" or "simplicial")
    #[builder(default = r#""multifrontal".to_string()"#)]
    pub direct_solve_method: String,

    ///elimination ordering ("natural" or "degree").  Ignored if `perm` is set.
    #[builder(default = r#""natural".to_string()"#)]
    pub ordering: String,

    ///user supplied elimination order. `perm[k]` is the variable eliminated at step `k`
    #[builder(default, setter(strip_option))]
    pub perm: Option<Vec<usize>>,

    ///maximum number of worker threads.  0 uses the available hardware concurrency
    #[builder(default = "0")]
    pub max_threads: u32,

    ///factorization fails if a pivot is smaller than this in magnitude
    #[builder(default = "(1e-12).as_T()")]
    pub pivot_tolerance: T,

    ///pivots smaller than this in magnitude are not divided by in the solve
    #[builder(default = "(1e-12).as_T()")]
    pub solve_tolerance: T,

    ///run the triangular solves through the parallel scheduler
    #[builder(default = "true")]
    pub parallel_solve: bool,

    ///bounded wait (milliseconds) of an idle scheduler worker before it rechecks
    #[builder(default = "10")]
    pub scheduler_wait_ms: u64,

    ///record the claim / completion order of fronts for inspection
    #[builder(default = "false")]
    pub trace_scheduling: bool,
}

impl<T> Default for SolverSettings<T>
where
    T: FloatT,
{
    fn default() -> SolverSettings<T> {
        SolverSettingsBuilder::<T>::default().build().unwrap()
    }
}

impl<T> SolverSettings<T>
where
    T: FloatT,
{
    /// Checks that the settings are valid.  String options must name a
    /// known choice, `pivot_tolerance` must be finite and positive and
    /// `solve_tolerance` finite and nonnegative.
    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_direct_solve_method(&self.direct_solve_method)?;
        validate_ordering(&self.ordering)?;
        validate_pivot_tolerance(self.pivot_tolerance)?;
        validate_tolerance(self.solve_tolerance, "solve_tolerance")?;
        Ok(())
    }
}

// pre build checker (for auto-validation when using the builder)

impl From<SettingsError> for SolverSettingsBuilderError {
    fn from(e: SettingsError) -> Self {
        SolverSettingsBuilderError::ValidationError(e.to_string())
    }
}

/// Automatic pre-build settings validation
impl<T> SolverSettingsBuilder<T>
where
    T: FloatT,
{
    /// check that the string-selected options and tolerances are valid
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(ref direct_solve_method) = self.direct_solve_method {
            validate_direct_solve_method(direct_solve_method)?;
        }
        if let Some(ref ordering) = self.ordering {
            validate_ordering(ordering)?;
        }
        if let Some(tol) = self.pivot_tolerance {
            validate_pivot_tolerance(tol)?;
        }
        if let Some(tol) = self.solve_tolerance {
            validate_tolerance(tol, "solve_tolerance")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------
// individual validation functions go here
// ---------------------------------------------------------

fn validate_direct_solve_method(direct_solve_method: &str) -> Result<(), SettingsError> {
    match direct_solve_method {
        "multifrontal" => Ok(()),
        "simplicial" => Ok(()),
        _ => Err(SettingsError::BadFieldValue("direct_solve_method")),
    }
}

fn validate_ordering(ordering: &str) -> Result<(), SettingsError> {
    match ordering {
        "natural" => Ok(()),
        "degree" => Ok(()),
        _ => Err(SettingsError::BadFieldValue("ordering")),
    }
}

fn validate_tolerance<T: FloatT>(tol: T, field: &'static str) -> Result<(), SettingsError> {
    if tol.is_finite() && tol >= T::zero() {
        Ok(())
    } else {
        Err(SettingsError::BadFieldValue(field))
    }
}

// a zero pivot must always fail the factorization
fn validate_pivot_tolerance<T: FloatT>(tol: T) -> Result<(), SettingsError> {
    if tol.is_finite() && tol > T::zero() {
        Ok(())
    } else {
        Err(SettingsError::BadFieldValue("pivot_tolerance"))
    }
}

#[test]
fn test_settings_validate() {
    // all standard settings
    let settings = SolverSettingsBuilder::<f64>::default().build().unwrap();
    assert_eq!(settings, SolverSettings::default());
    assert_eq!(settings.direct_solve_method, "multifrontal");
    assert_eq!(settings.pivot_tolerance, 1e-12);
    assert!(settings.perm.is_none());

    // fail on unknown direct solve method
    assert!(SolverSettingsBuilder::<f64>::default()
        .direct_solve_method("foo".to_string())
        .build()
        .is_err());

    // fail on unknown ordering
    assert!(SolverSettingsBuilder::<f64>::default()
        .ordering("amd".to_string())
        .build()
        .is_err());

    // fail on a negative tolerance
    assert!(SolverSettingsBuilder::<f64>::default()
        .pivot_tolerance(-1.0)
        .build()
        .is_err());

    // the pivot tolerance must be positive, the solve tolerance may be zero
    assert!(SolverSettingsBuilder::<f64>::default()
        .pivot_tolerance(0.0)
        .build()
        .is_err());
    assert!(SolverSettingsBuilder::<f64>::default()
        .solve_tolerance(0.0)
        .build()
        .is_ok());

    // a user ordering is accepted as given
    let settings = SolverSettingsBuilder::<f64>::default()
        .perm(vec![1, 0])
        .direct_solve_method("simplicial".to_string())
        .build()
        .unwrap();
    assert_eq!(settings.perm, Some(vec![1, 0]));

    let mut settings = SolverSettings::<f64>::default();
    settings.ordering = "bogus".to_string();
    assert_eq!(
        settings.validate(),
        Err(SettingsError::BadFieldValue("ordering"))
    );
}
