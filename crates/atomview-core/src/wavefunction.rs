//! Hydrogen-like wavefunction evaluation.
//!
//! `ψ_nlm(r, θ, φ) = R_nl(r) · Y_lm(θ, φ)` in atomic units (Bohr radius = 1, Z = 1).
//!
//! Everything that depends only on `(n, l, m)` (normalization constants, Laguerre
//! parameters, basis signs) is computed once in [`WavefunctionField::new`]; the
//! per-point work is two short recurrences.
//! Normalization constants are built in the log domain so that factorials never
//! materialize.

use std::f64::consts::{PI, SQRT_2};

use glam::{DVec3, UVec3};
use num_complex::Complex64;
use rayon::prelude::*;

use crate::error::{AtomViewError, Result};
use crate::grid::SampleGrid;
use crate::quantum::{Basis, QuantumState};

/// Wavefunction value at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Amplitude {
    /// Real-basis amplitude; only its sign carries phase information.
    Real(f64),
    /// Complex-basis amplitude.
    Complex(Complex64),
}

impl Amplitude {
    /// Zero amplitude in the given basis.
    #[must_use]
    pub fn zero(basis: Basis) -> Self {
        match basis {
            Basis::Real => Amplitude::Real(0.0),
            Basis::Complex => Amplitude::Complex(Complex64::new(0.0, 0.0)),
        }
    }

    /// Probability density `|ψ|²`.
    #[must_use]
    pub fn density(&self) -> f64 {
        match self {
            Amplitude::Real(a) => a * a,
            Amplitude::Complex(c) => c.norm_sqr(),
        }
    }

    /// Modulus `|ψ|`.
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        match self {
            Amplitude::Real(a) => a.abs(),
            Amplitude::Complex(c) => c.norm(),
        }
    }

    /// Phase angle in `[-π, π]`. Real amplitudes map to 0 or π.
    #[must_use]
    pub fn phase(&self) -> f64 {
        match self {
            Amplitude::Real(a) => {
                if *a < 0.0 {
                    PI
                } else {
                    0.0
                }
            }
            Amplitude::Complex(c) => c.arg(),
        }
    }

    /// Returns true if no component is NaN or infinite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        match self {
            Amplitude::Real(a) => a.is_finite(),
            Amplitude::Complex(c) => c.re.is_finite() && c.im.is_finite(),
        }
    }
}

/// Amplitude and density at one grid node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSample {
    /// Wavefunction value.
    pub amplitude: Amplitude,
    /// Probability density `|ψ|²`.
    pub density: f64,
}

impl FieldSample {
    fn new(amplitude: Amplitude) -> Self {
        Self {
            amplitude,
            density: amplitude.density(),
        }
    }
}

/// `ln(k!)` as a running sum of logs.
fn ln_factorial(k: u32) -> f64 {
    (2..=k).map(|i| f64::from(i).ln()).sum()
}

/// Normalized radial function `R_nl(r)`.
#[derive(Debug, Clone, Copy)]
pub struct RadialFunction {
    l: i32,
    /// `2 / n`: converts `r` to `ρ`.
    rho_scale: f64,
    /// Degree of the associated Laguerre polynomial, `n - l - 1`.
    degree: u32,
    /// Laguerre order, `2l + 1`.
    alpha: f64,
    ln_norm: f64,
}

impl RadialFunction {
    /// Precomputes the constants of `R_nl`.
    pub fn new(state: &QuantumState) -> Result<Self> {
        let n = f64::from(state.n());
        let ln_norm = 1.5 * (2.0 / n).ln()
            + 0.5
                * (ln_factorial(state.n() - state.l() - 1)
                    - (2.0 * n).ln()
                    - ln_factorial(state.n() + state.l()));
        if !ln_norm.is_finite() {
            log::warn!("{state}: radial normalization overflowed (ln N = {ln_norm})");
            return Err(AtomViewError::NumericInstability {
                context: "radial normalization",
                detail: format!("ln N = {ln_norm} for {state}"),
            });
        }
        #[allow(clippy::cast_possible_wrap)]
        let l = state.l() as i32;
        Ok(Self {
            l,
            rho_scale: 2.0 / n,
            degree: state.radial_nodes(),
            alpha: f64::from(2 * state.l() + 1),
            ln_norm,
        })
    }

    /// Generalized Laguerre polynomial `L_degree^alpha(x)` by upward recurrence.
    fn laguerre(&self, x: f64) -> f64 {
        if self.degree == 0 {
            return 1.0;
        }
        let mut prev = 1.0;
        let mut cur = 1.0 + self.alpha - x;
        for k in 1..self.degree {
            let k = f64::from(k);
            let next = ((2.0 * k + 1.0 + self.alpha - x) * cur - (k + self.alpha) * prev) / (k + 1.0);
            prev = cur;
            cur = next;
        }
        cur
    }

    /// Evaluates `R_nl(r)`. Finite at `r = 0` (zero unless `l = 0`).
    #[must_use]
    pub fn eval(&self, r: f64) -> f64 {
        let rho = self.rho_scale * r.max(0.0);
        let envelope = if rho > 0.0 {
            (self.ln_norm + f64::from(self.l) * rho.ln() - 0.5 * rho).exp()
        } else if self.l == 0 {
            self.ln_norm.exp()
        } else {
            0.0
        };
        envelope * self.laguerre(rho)
    }
}

/// Angular part `Y_lm(θ, φ)` in either basis.
#[derive(Debug, Clone, Copy)]
pub struct AngularFunction {
    l: u32,
    m: i32,
    m_abs: u32,
    basis: Basis,
    /// Normalization with the basis sign and `√2` already folded in.
    norm: f64,
}

impl AngularFunction {
    /// Precomputes the constants of `Y_lm` for the given basis.
    pub fn new(state: &QuantumState, basis: Basis) -> Result<Self> {
        let l = state.l();
        let m_abs = state.m_abs();
        let ln_k = 0.5
            * ((f64::from(2 * l + 1) / (4.0 * PI)).ln() + ln_factorial(l - m_abs)
                - ln_factorial(l + m_abs));
        let mut norm = ln_k.exp();
        if !norm.is_finite() || norm == 0.0 {
            log::warn!("{state}: angular normalization out of range (K = {norm})");
            return Err(AtomViewError::NumericInstability {
                context: "angular normalization",
                detail: format!("K = {norm} for {state}"),
            });
        }
        match basis {
            // Condon-Shortley phase; Y_l^{-m} = (-1)^m conj(Y_l^m) cancels it for m < 0.
            Basis::Complex => {
                if state.m() > 0 && m_abs % 2 == 1 {
                    norm = -norm;
                }
            }
            Basis::Real => {
                if state.m() != 0 {
                    norm *= SQRT_2;
                }
            }
        }
        Ok(Self {
            l,
            m: state.m(),
            m_abs,
            basis,
            norm,
        })
    }

    /// Associated Legendre function `P_l^|m|(x)` without the Condon-Shortley phase.
    fn legendre(&self, x: f64, sin_theta: f64) -> f64 {
        let m = self.m_abs;
        let mut pmm = 1.0;
        let mut odd = 1.0;
        for _ in 0..m {
            pmm *= odd * sin_theta;
            odd += 2.0;
        }
        if self.l == m {
            return pmm;
        }
        let mut pmmp1 = x * f64::from(2 * m + 1) * pmm;
        for ll in (m + 2)..=self.l {
            let pll = (f64::from(2 * ll - 1) * x * pmmp1 - f64::from(ll + m - 1) * pmm)
                / f64::from(ll - m);
            pmm = pmmp1;
            pmmp1 = pll;
        }
        pmmp1
    }

    /// Evaluates the angular part from `cos θ`, `sin θ` and `φ`.
    #[must_use]
    pub fn eval(&self, cos_theta: f64, sin_theta: f64, phi: f64) -> Amplitude {
        let p = self.norm * self.legendre(cos_theta, sin_theta);
        let m_phi = f64::from(self.m_abs) * phi;
        match self.basis {
            Basis::Complex => {
                let (s, c) = m_phi.sin_cos();
                let s = if self.m < 0 { -s } else { s };
                Amplitude::Complex(Complex64::new(p * c, p * s))
            }
            Basis::Real => Amplitude::Real(match self.m.signum() {
                0 => p,
                1 => p * m_phi.cos(),
                _ => p * m_phi.sin(),
            }),
        }
    }

    /// Evaluates the angular part in the direction of `point`.
    ///
    /// The origin is treated as lying on the +z axis.
    #[must_use]
    pub fn eval_direction(&self, point: DVec3) -> Amplitude {
        let r = point.length();
        if r == 0.0 {
            return self.eval(1.0, 0.0, 0.0);
        }
        let rho_xy = point.x.hypot(point.y);
        self.eval(point.z / r, rho_xy / r, point.y.atan2(point.x))
    }
}

/// The wavefunction of one quantum state in one basis, ready for evaluation.
#[derive(Debug, Clone, Copy)]
pub struct WavefunctionField {
    state: QuantumState,
    basis: Basis,
    radial: RadialFunction,
    angular: AngularFunction,
}

impl WavefunctionField {
    /// Precomputes all `(n, l, m)`-dependent constants.
    pub fn new(state: QuantumState, basis: Basis) -> Result<Self> {
        Ok(Self {
            state,
            basis,
            radial: RadialFunction::new(&state)?,
            angular: AngularFunction::new(&state, basis)?,
        })
    }

    /// The quantum state being evaluated.
    #[must_use]
    pub fn state(&self) -> QuantumState {
        self.state
    }

    /// The angular basis in use.
    #[must_use]
    pub fn basis(&self) -> Basis {
        self.basis
    }

    /// Evaluates `ψ` at a point (Bohr radii).
    #[must_use]
    pub fn amplitude(&self, point: DVec3) -> Amplitude {
        let radial = self.radial.eval(point.length());
        match self.angular.eval_direction(point) {
            Amplitude::Real(a) => Amplitude::Real(radial * a),
            Amplitude::Complex(c) => Amplitude::Complex(c * radial),
        }
    }

    /// Probability density `|ψ|²` at a point.
    #[must_use]
    pub fn density(&self, point: DVec3) -> f64 {
        self.amplitude(point).density()
    }

    /// Evaluates `ψ` at a point, rejecting non-finite results.
    pub fn sample(&self, point: DVec3) -> Result<FieldSample> {
        let sample = FieldSample::new(self.amplitude(point));
        if !sample.amplitude.is_finite() || !sample.density.is_finite() {
            return Err(self.instability(point));
        }
        Ok(sample)
    }

    /// Evaluates the field on every node of `grid`.
    ///
    /// With `parallel`, z-slabs are filled on the rayon pool; each slab writes
    /// only its own nodes, so the result does not depend on scheduling.
    pub fn evaluate_grid(&self, grid: &SampleGrid, parallel: bool) -> Result<SampledField> {
        let n = grid.num_pts();
        let row = n as usize;
        let slab_len = row * row;
        let mut samples = vec![FieldSample::new(Amplitude::zero(self.basis)); grid.len()];

        let fill = |(k, slab): (usize, &mut [FieldSample])| {
            #[allow(clippy::cast_possible_truncation)]
            let k = k as u32;
            for j in 0..n {
                for i in 0..n {
                    let amplitude = self.amplitude(grid.position(i, j, k));
                    slab[i as usize + row * j as usize] = FieldSample::new(amplitude);
                }
            }
        };
        if parallel {
            samples.par_chunks_mut(slab_len).enumerate().for_each(&fill);
        } else {
            samples.chunks_mut(slab_len).enumerate().for_each(&fill);
        }

        if let Some(idx) = samples
            .iter()
            .position(|s| !s.amplitude.is_finite() || !s.density.is_finite())
        {
            let node = grid.unflatten(idx);
            let point = grid.position(node.x, node.y, node.z);
            log::warn!("{}: non-finite amplitude at node {node} ({point})", self.state);
            return Err(self.instability(point));
        }

        Ok(SampledField {
            grid: *grid,
            basis: self.basis,
            samples,
        })
    }

    fn instability(&self, point: DVec3) -> AtomViewError {
        AtomViewError::NumericInstability {
            context: "wavefunction evaluation",
            detail: format!("non-finite amplitude for {} at {point}", self.state),
        }
    }
}

/// Evaluates `ψ` for `state` at a single point.
pub fn amplitude(state: QuantumState, point: DVec3, basis: Basis) -> Result<Amplitude> {
    Ok(WavefunctionField::new(state, basis)?.sample(point)?.amplitude)
}

/// Evaluates `state` over every node of `grid`.
pub fn evaluate_grid(state: QuantumState, grid: &SampleGrid, basis: Basis) -> Result<SampledField> {
    WavefunctionField::new(state, basis)?.evaluate_grid(grid, true)
}

/// A wavefunction sampled on a [`SampleGrid`].
#[derive(Debug, Clone)]
pub struct SampledField {
    grid: SampleGrid,
    basis: Basis,
    samples: Vec<FieldSample>,
}

impl SampledField {
    /// The lattice the samples live on.
    #[must_use]
    pub fn grid(&self) -> &SampleGrid {
        &self.grid
    }

    /// The basis the amplitudes are expressed in.
    #[must_use]
    pub fn basis(&self) -> Basis {
        self.basis
    }

    /// Samples in grid order.
    #[must_use]
    pub fn samples(&self) -> &[FieldSample] {
        &self.samples
    }

    /// Sample at node `(i, j, k)`.
    #[must_use]
    pub fn get(&self, i: u32, j: u32, k: u32) -> &FieldSample {
        &self.samples[self.grid.index(i, j, k)]
    }

    /// Largest sampled density.
    #[must_use]
    pub fn max_density(&self) -> f64 {
        self.samples.iter().map(|s| s.density).fold(0.0, f64::max)
    }

    /// Smallest sampled density.
    #[must_use]
    pub fn min_density(&self) -> f64 {
        self.samples
            .iter()
            .map(|s| s.density)
            .fold(f64::INFINITY, f64::min)
    }

    /// Riemann sum `Σ |ψ|² · ΔV` over the grid.
    #[must_use]
    pub fn total_probability(&self) -> f64 {
        self.samples.iter().map(|s| s.density).sum::<f64>() * self.grid.cell_volume()
    }

    /// Densities as `f32` surrounded by one layer of zero nodes, with the padded dims.
    ///
    /// Padded node `(i, j, k)` holds grid node `(i - 1, j - 1, k - 1)`. Any
    /// positive isovalue lies above the border, so a surface extracted from
    /// this field closes inside it even where it would run off the grid.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn padded_densities_f32(&self) -> (Vec<f32>, UVec3) {
        let n = self.grid.num_pts() as usize;
        let p = n + 2;
        let mut padded = vec![0.0_f32; p * p * p];
        for (row, chunk) in self.samples.chunks(n).enumerate() {
            let (j, k) = (row % n, row / n);
            let start = 1 + p * ((j + 1) + p * (k + 1));
            for (dst, sample) in padded[start..start + n].iter_mut().zip(chunk) {
                *dst = sample.density as f32;
            }
        }
        (padded, self.grid.dims() + UVec3::splat(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(n: u32, l: u32, m: i32) -> QuantumState {
        QuantumState::new(n, l, m).unwrap()
    }

    /// Trapezoid rule for `∫ R² r² dr` on `[0, r_max]`.
    fn radial_norm(n: u32, l: u32) -> f64 {
        let radial = RadialFunction::new(&state(n, l, 0)).unwrap();
        let r_max = 40.0 * f64::from(n * n) + 40.0;
        let steps = 200_000;
        let h = r_max / f64::from(steps);
        (1..steps)
            .map(|i| {
                let r = f64::from(i) * h;
                let v = radial.eval(r);
                v * v * r * r
            })
            .sum::<f64>()
            * h
    }

    #[test]
    fn test_radial_closed_forms() {
        let r10 = RadialFunction::new(&state(1, 0, 0)).unwrap();
        let r20 = RadialFunction::new(&state(2, 0, 0)).unwrap();
        let r21 = RadialFunction::new(&state(2, 1, 0)).unwrap();
        for r in [0.0, 0.3, 1.0, 2.5, 7.0] {
            assert!((r10.eval(r) - 2.0 * (-r).exp()).abs() < 1e-12);
            let expected_20 = (1.0 - r / 2.0) * (-r / 2.0).exp() / SQRT_2;
            assert!((r20.eval(r) - expected_20).abs() < 1e-12);
            let expected_21 = r * (-r / 2.0).exp() / (2.0 * 6.0_f64.sqrt());
            assert!((r21.eval(r) - expected_21).abs() < 1e-12);
        }
    }

    #[test]
    fn test_radial_normalized() {
        for (n, l) in [(1, 0), (2, 0), (2, 1), (3, 2), (5, 1), (8, 0), (8, 7)] {
            let norm = radial_norm(n, l);
            assert!((norm - 1.0).abs() < 1e-4, "n={n} l={l}: ∫R²r²dr = {norm}");
        }
    }

    #[test]
    fn test_radial_origin_limit() {
        assert!(RadialFunction::new(&state(3, 0, 0)).unwrap().eval(0.0) > 0.0);
        assert_eq!(RadialFunction::new(&state(3, 2, 0)).unwrap().eval(0.0), 0.0);
    }

    #[test]
    fn test_spherical_harmonic_closed_forms() {
        let y00 = AngularFunction::new(&state(1, 0, 0), Basis::Complex).unwrap();
        let y10 = AngularFunction::new(&state(2, 1, 0), Basis::Complex).unwrap();
        let y11 = AngularFunction::new(&state(2, 1, 1), Basis::Complex).unwrap();
        let y1m1 = AngularFunction::new(&state(2, 1, -1), Basis::Complex).unwrap();
        let (theta, phi) = (0.7_f64, 1.9_f64);
        let (st, ct) = theta.sin_cos();

        let Amplitude::Complex(v) = y00.eval(ct, st, phi) else { panic!() };
        assert!((v.re - 0.5 / PI.sqrt()).abs() < 1e-12);

        let Amplitude::Complex(v) = y10.eval(ct, st, phi) else { panic!() };
        assert!((v.re - (3.0 / (4.0 * PI)).sqrt() * ct).abs() < 1e-12);

        let expected = -(3.0 / (8.0 * PI)).sqrt() * st * Complex64::new(phi.cos(), phi.sin());
        let Amplitude::Complex(v) = y11.eval(ct, st, phi) else { panic!() };
        assert!((v - expected).norm() < 1e-12);

        // Y_1^{-1} = -conj(Y_1^1)
        let Amplitude::Complex(w) = y1m1.eval(ct, st, phi) else { panic!() };
        assert!((w + expected.conj()).norm() < 1e-12);
    }

    #[test]
    fn test_angular_normalized() {
        let steps_theta = 300;
        let steps_phi = 600;
        let d_theta = PI / f64::from(steps_theta);
        let d_phi = 2.0 * PI / f64::from(steps_phi);
        for basis in [Basis::Complex, Basis::Real] {
            for (l, m) in [(0, 0), (1, -1), (2, 1), (3, -2), (4, 4)] {
                let y = AngularFunction::new(&state(l + 1, l, m), basis).unwrap();
                let mut total = 0.0;
                for it in 0..steps_theta {
                    let theta = (f64::from(it) + 0.5) * d_theta;
                    let (st, ct) = theta.sin_cos();
                    for ip in 0..steps_phi {
                        let phi = (f64::from(ip) + 0.5) * d_phi;
                        total += y.eval(ct, st, phi).density() * st * d_theta * d_phi;
                    }
                }
                assert!((total - 1.0).abs() < 1e-3, "{basis:?} l={l} m={m}: {total}");
            }
        }
    }

    #[test]
    fn test_real_basis_orientation() {
        let px = WavefunctionField::new(state(2, 1, 1), Basis::Real).unwrap();
        let py = WavefunctionField::new(state(2, 1, -1), Basis::Real).unwrap();
        let pz = WavefunctionField::new(state(2, 1, 0), Basis::Real).unwrap();

        let Amplitude::Real(a) = px.amplitude(DVec3::new(2.0, 0.0, 0.0)) else { panic!() };
        assert!(a > 0.0);
        let Amplitude::Real(a) = px.amplitude(DVec3::new(-2.0, 0.0, 0.0)) else { panic!() };
        assert!(a < 0.0);
        let Amplitude::Real(a) = py.amplitude(DVec3::new(0.0, 2.0, 0.0)) else { panic!() };
        assert!(a > 0.0);
        assert!(py.density(DVec3::new(2.0, 0.0, 0.0)) < 1e-20);
        let Amplitude::Real(a) = pz.amplitude(DVec3::new(0.0, 0.0, -2.0)) else { panic!() };
        assert!(a < 0.0);
    }

    #[test]
    fn test_real_and_complex_density_agree() {
        let points = [
            DVec3::new(1.0, 2.0, -0.5),
            DVec3::new(-3.0, 0.2, 4.0),
            DVec3::new(0.0, 0.0, 1.5),
            DVec3::ZERO,
        ];
        for n in 1..=4 {
            for l in 0..n {
                #[allow(clippy::cast_possible_wrap)]
                let l_i = l as i32;
                for m in 0..=l_i {
                    let pair = |basis| {
                        let plus = WavefunctionField::new(state(n, l, m), basis).unwrap();
                        let minus = WavefunctionField::new(state(n, l, -m), basis).unwrap();
                        points.map(|p| {
                            if m == 0 {
                                plus.density(p)
                            } else {
                                plus.density(p) + minus.density(p)
                            }
                        })
                    };
                    let real = pair(Basis::Real);
                    let complex = pair(Basis::Complex);
                    for (a, b) in real.iter().zip(complex.iter()) {
                        assert!((a - b).abs() <= 1e-12 * b.max(1e-12), "n={n} l={l} m={m}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_origin_is_finite() {
        let s = WavefunctionField::new(state(1, 0, 0), Basis::Complex).unwrap();
        let sample = s.sample(DVec3::ZERO).unwrap();
        assert!((sample.density - 1.0 / PI).abs() < 1e-12);

        let d = WavefunctionField::new(state(3, 2, -1), Basis::Real).unwrap();
        assert_eq!(d.sample(DVec3::ZERO).unwrap().density, 0.0);
    }

    #[test]
    fn test_grid_normalization() {
        for (n, l, m, pts) in [(1, 0, 0, 80), (2, 0, 0, 80), (2, 1, 1, 70), (3, 2, 0, 90)] {
            let s = state(n, l, m);
            let grid =
                SampleGrid::for_state(&s, pts, &crate::options::BuildOptions::default()).unwrap();
            let field = evaluate_grid(s, &grid, Basis::Complex).unwrap();
            let total = field.total_probability();
            assert!((total - 1.0).abs() < 0.02, "{s}: Σ|ψ|²ΔV = {total}");
            assert!(field.min_density() >= 0.0);
        }
    }

    #[test]
    fn test_parallel_matches_serial() {
        let field = WavefunctionField::new(state(3, 1, -1), Basis::Complex).unwrap();
        let grid = SampleGrid::new(20.0, 17).unwrap();
        let a = field.evaluate_grid(&grid, true).unwrap();
        let b = field.evaluate_grid(&grid, false).unwrap();
        assert_eq!(a.samples(), b.samples());
    }

    #[test]
    fn test_grid_samples_sit_on_their_nodes() {
        let field = WavefunctionField::new(state(3, 2, 1), Basis::Real).unwrap();
        let grid = SampleGrid::new(15.0, 9).unwrap();
        let sampled = field.evaluate_grid(&grid, true).unwrap();
        for (i, j, k) in [(0, 0, 0), (8, 0, 0), (1, 7, 0), (2, 3, 5), (8, 8, 8)] {
            let expected = field.amplitude(grid.position(i, j, k));
            assert_eq!(sampled.get(i, j, k).amplitude, expected, "node ({i}, {j}, {k})");
        }
    }

    #[test]
    fn test_padded_densities_have_zero_border() {
        let s = state(2, 1, 1);
        let grid = SampleGrid::new(10.0, 5).unwrap();
        let sampled = evaluate_grid(s, &grid, Basis::Real).unwrap();
        let (padded, dims) = sampled.padded_densities_f32();
        assert_eq!(dims, UVec3::splat(7));
        assert_eq!(padded.len(), 7 * 7 * 7);

        let at = |i: usize, j: usize, k: usize| padded[i + 7 * (j + 7 * k)];
        for a in 0..7 {
            for b in 0..7 {
                for (i, j, k) in [(0, a, b), (6, a, b), (a, 0, b), (a, 6, b), (a, b, 0), (a, b, 6)] {
                    assert_eq!(at(i, j, k), 0.0);
                }
            }
        }
        for (i, j, k) in [(0, 0, 0), (4, 1, 2), (3, 3, 3), (2, 4, 0)] {
            #[allow(clippy::cast_possible_truncation)]
            let expected = sampled.get(i, j, k).density as f32;
            assert_eq!(at(i as usize + 1, j as usize + 1, k as usize + 1), expected);
        }
    }

    #[test]
    fn test_high_l_normalization_is_reported() {
        let s = state(200, 199, 199);
        for basis in [Basis::Real, Basis::Complex] {
            let err = WavefunctionField::new(s, basis).unwrap_err();
            assert!(matches!(err, AtomViewError::NumericInstability { .. }), "{err}");
            assert!(err.is_recoverable());
        }
        assert!(amplitude(s, DVec3::new(1.0, 2.0, 3.0), Basis::Real).is_err());
    }

    #[test]
    fn test_free_amplitude_validates() {
        let bad = QuantumState::new(2, 2, 0);
        assert!(bad.is_err());
        let a = amplitude(state(2, 1, 0), DVec3::new(0.0, 0.0, 1.0), Basis::Real).unwrap();
        assert!(matches!(a, Amplitude::Real(v) if v > 0.0));
    }
}
