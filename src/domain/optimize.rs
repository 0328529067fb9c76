//! Derivative-free minimization used by the distribution fitters.

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;
const NONZERO_STEP: f64 = 0.05;
const ZERO_STEP: f64 = 0.000_25;

/// Nelder–Mead simplex settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplexOptions {
    /// Stop once every vertex lies within this distance of the best one.
    pub xatol: f64,
    /// ... and every vertex value lies within this of the best value.
    pub fatol: f64,
    /// Iteration cap; `None` means 200 per dimension.
    pub max_iterations: Option<usize>,
    /// Objective evaluation cap; `None` means 200 per dimension.
    pub max_evaluations: Option<usize>,
}

impl Default for SimplexOptions {
    fn default() -> Self {
        Self {
            xatol: 1e-4,
            fatol: 1e-4,
            max_iterations: None,
            max_evaluations: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub converged: bool,
}

/// Minimize `f` from `x0` with the Nelder–Mead simplex method.
///
/// The initial simplex steps each coordinate by 5% of its value (or to
/// 0.00025 when it is zero). `f` may return `f64::INFINITY` to mark
/// infeasible points.
pub fn nelder_mead<F>(mut f: F, x0: &[f64], options: SimplexOptions) -> Minimum
where
    F: FnMut(&[f64]) -> f64,
{
    let n = x0.len();
    if n == 0 {
        return Minimum {
            x: Vec::new(),
            value: f(x0),
            iterations: 0,
            evaluations: 1,
            converged: true,
        };
    }
    let max_iterations = options.max_iterations.unwrap_or(200 * n);
    let max_evaluations = options.max_evaluations.unwrap_or(200 * n);
    let mut evaluations = 0usize;
    let mut eval = |x: &[f64], count: &mut usize| {
        *count += 1;
        f(x)
    };

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(x0.to_vec());
    for k in 0..n {
        let mut vertex = x0.to_vec();
        vertex[k] = if vertex[k] != 0.0 {
            (1.0 + NONZERO_STEP) * vertex[k]
        } else {
            ZERO_STEP
        };
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex
        .iter()
        .map(|v| eval(v, &mut evaluations))
        .collect();
    sort_simplex(&mut simplex, &mut values);

    let mut iterations = 1usize;
    let mut converged = false;
    while evaluations < max_evaluations && iterations < max_iterations {
        if has_converged(&simplex, &values, options) {
            converged = true;
            break;
        }

        let worst = simplex[n].clone();
        let centroid = centroid(&simplex[..n]);
        let reflected = affine(&centroid, &worst, 1.0 + REFLECT, -REFLECT);
        let f_reflected = eval(&reflected, &mut evaluations);
        let mut shrink = false;

        if f_reflected < values[0] {
            let expanded = affine(&centroid, &worst, 1.0 + REFLECT * EXPAND, -REFLECT * EXPAND);
            let f_expanded = eval(&expanded, &mut evaluations);
            if f_expanded < f_reflected {
                simplex[n] = expanded;
                values[n] = f_expanded;
            } else {
                simplex[n] = reflected;
                values[n] = f_reflected;
            }
        } else if f_reflected < values[n - 1] {
            simplex[n] = reflected;
            values[n] = f_reflected;
        } else if f_reflected < values[n] {
            let outside = affine(
                &centroid,
                &worst,
                1.0 + CONTRACT * REFLECT,
                -CONTRACT * REFLECT,
            );
            let f_outside = eval(&outside, &mut evaluations);
            if f_outside <= f_reflected {
                simplex[n] = outside;
                values[n] = f_outside;
            } else {
                shrink = true;
            }
        } else {
            let inside = affine(&centroid, &worst, 1.0 - CONTRACT, CONTRACT);
            let f_inside = eval(&inside, &mut evaluations);
            if f_inside < values[n] {
                simplex[n] = inside;
                values[n] = f_inside;
            } else {
                shrink = true;
            }
        }

        if shrink {
            let best = simplex[0].clone();
            for j in 1..=n {
                simplex[j] = affine(&best, &simplex[j], 1.0 - SHRINK, SHRINK);
                values[j] = eval(&simplex[j], &mut evaluations);
            }
        }

        iterations += 1;
        sort_simplex(&mut simplex, &mut values);
    }

    if !converged {
        converged = has_converged(&simplex, &values, options);
        if !converged {
            tracing::debug!(iterations, evaluations, "simplex stopped before converging");
        }
    }

    Minimum {
        x: simplex.swap_remove(0),
        value: values[0],
        iterations,
        evaluations,
        converged,
    }
}

fn has_converged(simplex: &[Vec<f64>], values: &[f64], options: SimplexOptions) -> bool {
    let best = &simplex[0];
    let x_spread = simplex[1..]
        .iter()
        .flat_map(|v| v.iter().zip(best).map(|(a, b)| (a - b).abs()))
        .fold(0.0_f64, f64::max);
    // An infinite spread (or inf - inf = NaN) never counts as converged.
    let f_spread = values[1..]
        .iter()
        .map(|v| (values[0] - v).abs())
        .fold(0.0_f64, |acc, d| if d.is_nan() { f64::INFINITY } else { acc.max(d) });
    x_spread <= options.xatol && f_spread <= options.fatol
}

fn centroid(vertices: &[Vec<f64>]) -> Vec<f64> {
    let n = vertices.len() as f64;
    let mut c = vec![0.0; vertices[0].len()];
    for v in vertices {
        for (ci, vi) in c.iter_mut().zip(v) {
            *ci += vi;
        }
    }
    c.iter_mut().for_each(|ci| *ci /= n);
    c
}

/// `a * wa + b * wb`, component-wise.
fn affine(a: &[f64], b: &[f64], wa: f64, wb: f64) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| wa * x + wb * y).collect()
}

fn sort_simplex(simplex: &mut Vec<Vec<f64>>, values: &mut Vec<f64>) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));
    *simplex = order.iter().map(|&i| simplex[i].clone()).collect();
    *values = order.iter().map(|&i| values[i]).collect();
}
