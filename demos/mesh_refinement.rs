//! Example: Mesh Refinement Study
//!
//! Solves the spherical particle discharge on a sequence of finer and
//! finer meshes and watches the answer converge:
//!
//! - Resolutions: 5, 10, 20, 40, 80 cells over the particle radius
//! - Time integration: adaptive RKF45 with tight tolerances, so the
//!   remaining error is dominated by the spatial discretization
//! - Observable: surface concentration c(r=1) at the end of discharge
//!
//! The finite-volume scheme is second order on a uniform mesh, so each
//! doubling of the resolution should shrink the change in the answer by
//! about a factor of four (observed order ≈ 2).

use bamm_rs::{
    models::SphericalDiffusion,
    simulation::Simulation,
    solver::{RK45Solver, Solver, TimeSpan},
};

use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("═══════════════════════════════════════════════════════");
    println!("  Mesh Refinement Study: Spherical Discharge");
    println!("═══════════════════════════════════════════════════════\n");

    // ====== Configuration ======

    let resolutions = [5usize, 10, 20, 40, 80];
    let span = TimeSpan::new(0.0, 1.0);
    let solver = RK45Solver::new().with_tolerances(1e-9, 1e-12);

    println!("Configuration:");
    println!("  resolutions : {resolutions:?} cells");
    println!("  time span   : [{}, {}]", span.start(), span.end());
    println!("  solver      : {} (rtol {:.0e}, atol {:.0e})\n",
             solver.name(), solver.rtol(), solver.atol());

    // =============================================================================================
    // Refinement Sweep
    // =============================================================================================

    println!("═══════════════════════════════════════════════════════");
    println!("  Running {} Resolutions", resolutions.len());
    println!("═══════════════════════════════════════════════════════\n");

    // (cells, elapsed seconds, samples, surface concentration at t=1)
    let mut sweep: Vec<(usize, f64, usize, f64)> = Vec::new();

    for &cells in &resolutions {
        print!("  {cells:>3} cells ... ");
        std::io::Write::flush(&mut std::io::stdout())?;

        let particle = SphericalDiffusion::new();
        let simulation = Simulation::new(particle.model(), particle.geometry())
            .with_parameter_values(particle.parameter_values())
            .with_points(SphericalDiffusion::COORDINATE, cells);

        let start = Instant::now();
        let solution = simulation.solve(&solver, span)?;
        let elapsed = start.elapsed().as_secs_f64();

        let surface = solution.variable(SphericalDiffusion::SURFACE_CONCENTRATION)?;
        let values = surface.as_scalars().expect("surface output is scalar");
        let final_surface = *values.last().unwrap();

        println!("✓ {elapsed:.3}s, {} samples", solution.len());
        sweep.push((cells, elapsed, solution.len(), final_surface));
    }

    // =============================================================================================
    // Convergence Analysis
    // =============================================================================================

    println!("\n═══════════════════════════════════════════════════════");
    println!("  Convergence of c(r=1) at t=1");
    println!("═══════════════════════════════════════════════════════\n");

    println!("{:>6} {:>18} {:>14} {:>8}", "Cells", "c(1) at t=1", "Δ previous", "Order");
    println!("{:-<50}", "");

    let mut previous_delta: Option<f64> = None;
    for (i, (cells, _, _, value)) in sweep.iter().enumerate() {
        if i == 0 {
            println!("{cells:>6} {value:>18.10} {:>14} {:>8}", "-", "-");
            continue;
        }

        let delta = (value - sweep[i - 1].3).abs();
        match previous_delta {
            // Observed order: each doubling divides the change by 2^p.
            Some(prev) if delta > 0.0 => {
                let order = (prev / delta).log2();
                println!("{cells:>6} {value:>18.10} {delta:>14.3e} {order:>8.2}");
            }
            _ => println!("{cells:>6} {value:>18.10} {delta:>14.3e} {:>8}", "-"),
        }
        previous_delta = Some(delta);
    }

    // ====== Richardson extrapolation ======

    let coarse = sweep[sweep.len() - 2].3;
    let fine = sweep[sweep.len() - 1].3;
    let extrapolated = fine + (fine - coarse) / 3.0;

    println!("\nRichardson extrapolation (second order assumed):");
    println!("  {} cells      : {:.10}", sweep[sweep.len() - 2].0, coarse);
    println!("  {} cells      : {:.10}", sweep[sweep.len() - 1].0, fine);
    println!("  extrapolated  : {extrapolated:.10}");
    println!("  finest error  : {:.3e}", (fine - extrapolated).abs());

    // =============================================================================================
    // Cost Scaling
    // =============================================================================================

    println!("\n═══════════════════════════════════════════════════════");
    println!("  Cost Scaling");
    println!("═══════════════════════════════════════════════════════\n");

    println!("{:>6} {:>12} {:>10}", "Cells", "Time (s)", "Samples");
    println!("{:-<30}", "");
    for (cells, elapsed, samples, _) in &sweep {
        println!("{cells:>6} {elapsed:>12.3} {samples:>10}");
    }

    println!("\nExpected: the accepted-step count grows with resolution");
    println!("because the diffusion stability limit tightens as Δr², so");
    println!("the adaptive solver pays for fine meshes in smaller steps.");

    Ok(())
}
