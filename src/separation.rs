// src/separation.rs

//! Single-channel separation in the relative-phase time-frequency domain.
//!
//! A [`SpectralTransform`] turns a signal into a complex spectrum
//! `|STFT| · exp(i·Δφ)`, where Δφ is the phase change between consecutive
//! frames minus the nominal advance of each bin. JADE treats frames as
//! sensors and frequency bins as samples. Each separated source is brought
//! back to magnitude and absolute phase and handed to the transform for
//! resynthesis.

use crate::config::JadeConfig;
use crate::error::{JadeError, Result};
use crate::result::JadeResult;
use crate::solver::Jade;
use log::{debug, info};
use ndarray::{Array1, Array2};
use num_complex::Complex64;

/// Relative-phase spectrum of a signal.
#[derive(Debug, Clone)]
pub struct RelativePhaseSpectrum {
    spectrum: Array2<Complex64>,
    phase_advance: Array1<f64>,
}

impl RelativePhaseSpectrum {
    /// Wrap a relative-phase spectrum.
    ///
    /// # Arguments
    /// * `spectrum` - Complex spectrum of shape (n_bins, n_frames)
    /// * `phase_advance` - Nominal phase advance per frame for each bin (n_bins,)
    pub fn new(spectrum: Array2<Complex64>, phase_advance: Array1<f64>) -> Result<Self> {
        if phase_advance.len() != spectrum.nrows() {
            return Err(JadeError::dimensions(format!(
                "phase advance has {} bins but the spectrum has {}",
                phase_advance.len(),
                spectrum.nrows()
            )));
        }

        Ok(Self {
            spectrum,
            phase_advance,
        })
    }

    /// Build the spectrum from magnitudes and relative phases.
    pub fn from_polar(
        magnitude: &Array2<f64>,
        relative_phase: &Array2<f64>,
        phase_advance: Array1<f64>,
    ) -> Result<Self> {
        if magnitude.dim() != relative_phase.dim() {
            return Err(JadeError::dimensions(format!(
                "magnitude shape {:?} does not match phase shape {:?}",
                magnitude.shape(),
                relative_phase.shape()
            )));
        }

        let mut spectrum = Array2::zeros(magnitude.dim());
        ndarray::Zip::from(&mut spectrum)
            .and(magnitude)
            .and(relative_phase)
            .for_each(|z, &mag, &phase| *z = Complex64::from_polar(mag, phase));

        Self::new(spectrum, phase_advance)
    }

    /// Complex spectrum (n_bins × n_frames).
    pub fn spectrum(&self) -> &Array2<Complex64> {
        &self.spectrum
    }

    /// Phase advance per frame for each bin.
    pub fn phase_advance(&self) -> &Array1<f64> {
        &self.phase_advance
    }

    /// Number of frequency bins.
    pub fn n_bins(&self) -> usize {
        self.spectrum.nrows()
    }

    /// Number of frames.
    pub fn n_frames(&self) -> usize {
        self.spectrum.ncols()
    }
}

/// Time-frequency analysis and resynthesis used around the separation.
///
/// Frame size, hop and window are implementation details of the transform.
pub trait SpectralTransform {
    /// Compute the relative-phase spectrum of `signal`.
    fn analyze(&self, signal: &[f64]) -> Result<RelativePhaseSpectrum>;

    /// Resynthesize a signal from magnitudes and absolute phases (n_bins × n_frames).
    fn synthesize(&self, magnitude: &Array2<f64>, phase: &Array2<f64>) -> Result<Vec<f64>>;
}

/// Magnitude and absolute phase of a separated spectrum.
#[derive(Debug, Clone)]
pub struct SpectralEstimate {
    /// Magnitudes (n_bins × n_frames).
    pub magnitude: Array2<f64>,
    /// Absolute phases (n_bins × n_frames).
    pub phase: Array2<f64>,
}

impl SpectralEstimate {
    /// Convert a sensor-space product (n_frames × n_bins) back to the spectrum layout.
    fn from_product(product: Array2<Complex64>, phase_advance: &Array1<f64>) -> Self {
        // Plain transpose, no conjugation
        let relative = product.reversed_axes();
        Self {
            magnitude: relative.mapv(|z| z.norm()),
            phase: reconstruct_phase(&relative, phase_advance),
        }
    }
}

/// Recover absolute phases from a relative-phase spectrum.
///
/// For every bin, the phase at frame f is the running sum over frames up to
/// f of `arg(relative) + phase_advance`.
pub fn reconstruct_phase(relative: &Array2<Complex64>, phase_advance: &Array1<f64>) -> Array2<f64> {
    let mut phase = relative.mapv(|z| z.arg());
    for (mut row, &advance) in phase.rows_mut().into_iter().zip(phase_advance.iter()) {
        let mut acc = 0.0;
        for p in row.iter_mut() {
            acc += *p + advance;
            *p = acc;
        }
    }
    phase
}

/// Configuration for relative-phase separation.
#[derive(Debug, Clone, PartialEq)]
pub struct SeparationConfig {
    /// Number of sources to extract.
    pub n_sources: usize,
    /// JADE settings. `n_components` is replaced by `n_sources`.
    pub jade: JadeConfig,
}

impl Default for SeparationConfig {
    fn default() -> Self {
        Self {
            n_sources: 20,
            jade: JadeConfig::default(),
        }
    }
}

impl SeparationConfig {
    /// Configuration extracting `n_sources` sources with default JADE settings.
    pub fn new(n_sources: usize) -> Self {
        Self {
            n_sources,
            ..Self::default()
        }
    }

    /// Replace the JADE settings.
    pub fn with_jade(mut self, jade: JadeConfig) -> Self {
        self.jade = jade;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.n_sources == 0 {
            return Err(JadeError::config("n_sources", "must be at least 1"));
        }
        self.jade.validate()
    }
}

/// Spectral estimates of the separated sources.
#[derive(Debug, Clone)]
pub struct SpectralSeparation {
    /// One estimate per source.
    pub sources: Vec<SpectralEstimate>,
    /// Estimate of all sources remixed.
    pub mixture: SpectralEstimate,
    /// Underlying JADE result.
    pub result: JadeResult,
}

/// Separated time-domain signals.
#[derive(Debug, Clone)]
pub struct SeparatedSignals {
    /// One signal per source.
    pub sources: Vec<Vec<f64>>,
    /// All sources remixed.
    pub mixture: Vec<f64>,
    /// Whether JADE converged.
    pub converged: bool,
}

/// Separate a relative-phase spectrum into `config.n_sources` sources.
pub fn separate_spectrum(
    spectrum: &RelativePhaseSpectrum,
    config: &SeparationConfig,
) -> Result<SpectralSeparation> {
    config.validate()?;

    if config.n_sources > spectrum.n_frames() {
        return Err(JadeError::dimensions(format!(
            "cannot extract {} sources from {} frames",
            config.n_sources,
            spectrum.n_frames()
        )));
    }

    // Frames are the sensors, bins the samples
    let x = spectrum.spectrum().t().to_owned();

    let jade_config = JadeConfig {
        n_components: Some(config.n_sources),
        ..config.jade.clone()
    };
    let result = Jade::separate_with_config(&x, &jade_config)?;

    let mixture = SpectralEstimate::from_product(result.reconstruct(), spectrum.phase_advance());
    let sources = (0..config.n_sources)
        .map(|k| {
            result
                .component(k)
                .map(|product| SpectralEstimate::from_product(product, spectrum.phase_advance()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SpectralSeparation {
        sources,
        mixture,
        result,
    })
}

/// Separate a single-channel signal using `transform` for analysis and resynthesis.
pub fn separate_signal<T>(
    transform: &T,
    signal: &[f64],
    config: &SeparationConfig,
) -> Result<SeparatedSignals>
where
    T: SpectralTransform + ?Sized,
{
    let spectrum = transform.analyze(signal)?;
    debug!(
        "separation: {} bins x {} frames, {} sources",
        spectrum.n_bins(),
        spectrum.n_frames(),
        config.n_sources
    );

    let separation = separate_spectrum(&spectrum, config)?;

    let sources = separation
        .sources
        .iter()
        .map(|estimate| transform.synthesize(&estimate.magnitude, &estimate.phase))
        .collect::<Result<Vec<_>>>()?;
    let mixture = transform.synthesize(&separation.mixture.magnitude, &separation.mixture.phase)?;

    info!(
        "separated {} sources from {} samples",
        sources.len(),
        signal.len()
    );

    Ok(SeparatedSignals {
        sources,
        mixture,
        converged: separation.result.converged,
    })
}
