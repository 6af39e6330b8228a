use std::f64::consts::PI;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::FilterError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BandPassFilterConfig {
    pub f_low: f64,
    pub f_high: f64,
    pub order: usize,
}

impl Default for BandPassFilterConfig {
    fn default() -> Self {
        Self {
            f_low: 0.5,
            f_high: 50.0,
            order: 5,
        }
    }
}

impl BandPassFilterConfig {
    pub fn validate(&self, fs: f64) -> Result<(), FilterError> {
        if !(fs.is_finite() && fs > 0.0) {
            return Err(FilterError::InvalidSampleRate(fs));
        }
        if self.order == 0 {
            return Err(FilterError::InvalidOrder);
        }
        let nyquist = fs / 2.0;
        // Written so that NaN bounds fail as well
        if !(0.0 < self.f_low && self.f_low < self.f_high && self.f_high < nyquist) {
            return Err(FilterError::InvalidBand {
                low: self.f_low,
                high: self.f_high,
                nyquist,
            });
        }
        Ok(())
    }
}

/// Zero-phase Butterworth band-pass over a whole buffer.
///
/// Convenience wrapper that designs the filter and applies it once. The
/// acquisition loop keeps a [`BandPassFilter`] around instead so the design
/// is only done once per session.
pub fn bandpass_filter(
    samples: &[f64],
    f_low: f64,
    f_high: f64,
    fs: f64,
    order: usize,
) -> Result<Vec<f64>, FilterError> {
    let config = BandPassFilterConfig {
        f_low,
        f_high,
        order,
    };
    Ok(BandPassFilter::new(config, fs)?.filter(samples))
}

/// Digital Butterworth band-pass as a cascade of second-order sections.
///
/// The analog prototype of `order` poles is moved to the band with the
/// low-pass to band-pass transform, giving `2 * order` poles and `order`
/// zeros at DC, then mapped to z with the bilinear transform on pre-warped
/// band edges. Every section ends up with one zero at z = 1 and one at
/// z = -1, so only the poles differ between sections.
#[derive(Debug, Clone)]
pub struct BandPassFilter {
    config: BandPassFilterConfig,
    fs: f64,
    sections: Vec<SecondOrderFilter>,
}

#[derive(Debug, Clone, PartialEq)]
struct SecondOrderFilter {
    b: [f64; 3],
    a: [f64; 3],
}

impl SecondOrderFilter {
    fn from_poles(p1: Complex64, p2: Complex64) -> Self {
        let sum = p1 + p2;
        let product = p1 * p2;
        SecondOrderFilter {
            b: [1.0, 0.0, -1.0],
            a: [1.0, -sum.re, product.re],
        }
    }

    fn response(&self, z: Complex64) -> Complex64 {
        let z1 = z.inv();
        let z2 = z1 * z1;
        let numerator = z2 * self.b[2] + z1 * self.b[1] + self.b[0];
        let denominator = z2 * self.a[2] + z1 * self.a[1] + self.a[0];
        numerator / denominator
    }

    // Delay-line state that a unit step would have settled to.
    fn steady_state(&self) -> [f64; 2] {
        let dc_gain = (self.b[0] + self.b[1] + self.b[2]) / (self.a[0] + self.a[1] + self.a[2]);
        let z2 = self.b[2] - self.a[2] * dc_gain;
        let z1 = dc_gain - self.b[0];
        [z1, z2]
    }

    // Transposed direct form II, in place.
    fn calculate_output(&self, data: &mut [f64], mut state: [f64; 2]) {
        for value in data.iter_mut() {
            let input = *value;
            let output = self.b[0] * input + state[0];
            state[0] = self.b[1] * input - self.a[1] * output + state[1];
            state[1] = self.b[2] * input - self.a[2] * output;
            *value = output;
        }
    }
}

impl BandPassFilter {
    pub fn new(config: BandPassFilterConfig, fs: f64) -> Result<Self, FilterError> {
        config.validate(fs)?;

        let order = config.order;
        let fs2 = 2.0 * fs;
        let w_low = fs2 * (PI * config.f_low / fs).tan();
        let w_high = fs2 * (PI * config.f_high / fs).tan();
        let bandwidth = w_high - w_low;
        let w0_squared = w_low * w_high;

        let mut poles = Vec::with_capacity(2 * order);
        for k in 0..order {
            let theta = PI * (2 * k + order + 1) as f64 / (2 * order) as f64;
            let prototype = Complex64::from_polar(1.0, theta);
            let half = prototype * (bandwidth / 2.0);
            let root = (half * half - w0_squared).sqrt();
            for s in [half + root, half - root] {
                poles.push((s + fs2) / (-s + fs2));
            }
        }

        let mut sections = pair_poles(&poles);

        // Unity gain at the (digital) band centre.
        let centre = 2.0 * (w0_squared.sqrt() / fs2).atan();
        let z = Complex64::from_polar(1.0, centre);
        let response = sections
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, section| acc * section.response(z));
        let section_gain = (1.0 / response.norm()).powf(1.0 / sections.len() as f64);
        for section in &mut sections {
            for coefficient in &mut section.b {
                *coefficient *= section_gain;
            }
        }

        Ok(BandPassFilter {
            config,
            fs,
            sections,
        })
    }

    pub fn config(&self) -> &BandPassFilterConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f64 {
        self.fs
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Forward-backward filter `samples`, returning a buffer of the same length.
    ///
    /// The signal is padded with an odd extension at both ends and each pass
    /// starts from steady-state initial conditions, which keeps the edges from
    /// ringing.
    pub fn filter(&self, samples: &[f64]) -> Vec<f64> {
        if samples.is_empty() {
            return Vec::new();
        }

        let len = samples.len();
        let padlen = (3 * (2 * self.sections.len() + 1)).min(len - 1);
        let mut extended = odd_extension(samples, padlen);

        self.run_pass(&mut extended);
        extended.reverse();
        self.run_pass(&mut extended);
        extended.reverse();

        extended[padlen..padlen + len].to_vec()
    }

    fn run_pass(&self, data: &mut [f64]) {
        for section in &self.sections {
            // data[0] is this section's first input, i.e. x0 scaled by the
            // DC gain of the sections before it.
            let x0 = data[0];
            let [z1, z2] = section.steady_state();
            section.calculate_output(data, [z1 * x0, z2 * x0]);
        }
    }
}

fn pair_poles(poles: &[Complex64]) -> Vec<SecondOrderFilter> {
    const IMAG_TOLERANCE: f64 = 1e-10;

    let mut sections = Vec::with_capacity(poles.len() / 2);
    let mut real_poles = Vec::new();

    for pole in poles {
        if pole.im > IMAG_TOLERANCE {
            sections.push(SecondOrderFilter::from_poles(*pole, pole.conj()));
        } else if pole.im.abs() <= IMAG_TOLERANCE {
            real_poles.push(Complex64::new(pole.re, 0.0));
        }
    }

    for pair in real_poles.chunks(2) {
        match pair {
            [p1, p2] => sections.push(SecondOrderFilter::from_poles(*p1, *p2)),
            [p] => sections.push(SecondOrderFilter::from_poles(*p, Complex64::new(0.0, 0.0))),
            _ => {}
        }
    }

    sections
}

fn odd_extension(samples: &[f64], n: usize) -> Vec<f64> {
    let len = samples.len();
    let first = samples[0];
    let last = samples[len - 1];

    let mut extended = Vec::with_capacity(len + 2 * n);
    extended.extend((1..=n).rev().map(|i| 2.0 * first - samples[i]));
    extended.extend_from_slice(samples);
    extended.extend((1..=n).map(|i| 2.0 * last - samples[len - 1 - i]));
    extended
}
