//! Headless CLI for the linkarm kinematics library.
//!
//! Two modes of operation:
//! - `fk`: print joint positions for given per-linkage bend/twist angles
//! - `ik`: run CCD passes toward a target point, printing each residual
//!
//! Angles are taken and printed in degrees at this boundary; the library
//! works in radians throughout. Run with `RUST_LOG=trace` for the library's
//! degenerate-geometry diagnostics.

use clap::{Parser, Subcommand};
use nalgebra::Point3;

use linkarm_ik::extract::extract_angles_into;
use linkarm_ik::{solve_step, LinkChain};

/// Serial-chain kinematics driver (forward kinematics + CCD IK).
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print joint positions for the given angles.
    Fk {
        /// Comma-separated linkage lengths, e.g. "1,1,1,1".
        #[arg(short, long, default_value = "1,1,1,1")]
        lengths: String,

        /// Comma-separated bend angles in degrees, one per linkage
        /// (default: all zero).
        #[arg(short, long)]
        pitch: Option<String>,

        /// Comma-separated twist angles in degrees, one per linkage
        /// (default: all zero).
        #[arg(short, long)]
        rotate: Option<String>,
    },

    /// Solve IK toward a target point with CCD.
    Ik {
        /// Comma-separated linkage lengths, e.g. "1,1,1,1".
        #[arg(short, long, default_value = "1,1,1,1")]
        lengths: String,

        /// Target point as "x,y,z".
        #[arg(short, long)]
        target: String,

        /// Maximum CCD passes.
        #[arg(short = 'n', long, default_value_t = 10)]
        iterations: u32,

        /// Acceptance tolerance on the end-effector distance.
        #[arg(short = 'e', long, default_value_t = 1e-3)]
        tolerance: f32,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Fk {
            lengths,
            pitch,
            rotate,
        } => run_fk(&lengths, pitch.as_deref(), rotate.as_deref()),
        Commands::Ik {
            lengths,
            target,
            iterations,
            tolerance,
        } => run_ik(&lengths, &target, iterations, tolerance),
    }
}

fn run_fk(
    lengths: &str,
    pitch: Option<&str>,
    rotate: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let lengths = parse_list(lengths)?;
    let n = lengths.len();
    let pitch = parse_angles(pitch, n)?;
    let rotate = parse_angles(rotate, n)?;

    let chain = LinkChain::with_angles(lengths, pitch, rotate)?;
    print_positions(&chain.forward_kinematics());
    Ok(())
}

fn run_ik(
    lengths: &str,
    target: &str,
    iterations: u32,
    tolerance: f32,
) -> Result<(), Box<dyn std::error::Error>> {
    let chain = LinkChain::new(parse_list(lengths)?)?;
    let target = parse_point(target)?;

    let mut positions = chain.forward_kinematics();
    let mut pitch = chain.pitch().to_vec();
    let mut rotate = chain.rotate().to_vec();

    let mut residual = (positions[chain.links()] - target).norm();
    let mut passes = 0;
    while residual >= tolerance && passes < iterations {
        residual = solve_step(
            &mut positions,
            &mut pitch,
            &mut rotate,
            chain.lengths(),
            &target,
            tolerance,
        );
        passes += 1;
        println!("pass {passes}: residual {residual:.6}");
    }

    if residual < tolerance {
        // a converging pass skips its own re-extraction
        extract_angles_into(&positions, chain.lengths(), &mut pitch, &mut rotate);
        println!("converged after {passes} passes, residual {residual:.6}");
    } else {
        // best effort is a normal outcome; the residual says how far off it is
        println!("budget of {passes} passes exhausted, residual {residual:.6}");
    }

    println!("pitch (deg):  {}", format_degrees(&pitch));
    println!("rotate (deg): {}", format_degrees(&rotate));
    print_positions(&positions);
    Ok(())
}

fn print_positions(positions: &[Point3<f32>]) {
    for (i, p) in positions.iter().enumerate() {
        print!("joint {i}: ({:.3}, {:.3}, {:.3})", p.x, p.y, p.z);
        if i > 0 {
            let length = (positions[i] - positions[i - 1]).norm();
            print!("  length={length:.2}");
        }
        if i > 1 {
            let prev = positions[i - 1] - positions[i - 2];
            let this = positions[i] - positions[i - 1];
            print!("  bend={:.2}°", this.angle(&prev).to_degrees());
        }
        println!();
    }
}

fn format_degrees(angles: &[f32]) -> String {
    angles
        .iter()
        .map(|a| format!("{:.2}", a.to_degrees()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_list(s: &str) -> Result<Vec<f32>, String> {
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .map_err(|e| format!("invalid number {:?}: {e}", part.trim()))
        })
        .collect()
}

fn parse_angles(s: Option<&str>, links: usize) -> Result<Vec<f32>, String> {
    match s {
        None => Ok(vec![0.0; links]),
        Some(s) => Ok(parse_list(s)?.iter().map(|a| a.to_radians()).collect()),
    }
}

fn parse_point(s: &str) -> Result<Point3<f32>, String> {
    let parts = parse_list(s)?;
    match parts.as_slice() {
        &[x, y, z] => Ok(Point3::new(x, y, z)),
        other => Err(format!("expected \"x,y,z\", got {} values", other.len())),
    }
}
