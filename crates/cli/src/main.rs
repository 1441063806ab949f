#![deny(unsafe_code)]
//! CLI binary for inspecting ember geometry offline.
//!
//! Subcommands:
//! - `tessellate circle|cylinder` -- generate a shape, print its draw list
//! - `pick` -- test a ray against spheres and a plane

mod error;
mod logging;
mod query;

use clap::{Parser, Subcommand};
use ember_core::{create_circle, create_cylinder, Circle, Cylinder, Ray};
use error::CliError;
use logging::{init_logging, LoggingConfig};
use query::{PickQuery, ShapeReport};
use std::process;

#[derive(Parser)]
#[command(name = "ember", about = "Tessellation and picking inspector")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Tessellate a shape into triangle-fan vertices.
    Tessellate {
        #[command(subcommand)]
        shape: Shape,
    },
    /// Test a ray against spheres and an optional plane.
    Pick {
        /// Ray origin as x,y,z.
        #[arg(long, required_unless_present = "query")]
        origin: Option<String>,

        /// Ray direction as x,y,z (need not be normalized).
        #[arg(long, required_unless_present = "query")]
        direction: Option<String>,

        /// Bounding sphere as x,y,z,radius. Repeatable.
        #[arg(long = "sphere")]
        spheres: Vec<String>,

        /// Plane as px,py,pz,nx,ny,nz.
        #[arg(long)]
        plane: Option<String>,

        /// Whole query as JSON: {"ray": .., "spheres": [..], "plane": ..}.
        #[arg(long, conflicts_with_all = ["origin", "direction", "spheres", "plane"])]
        query: Option<String>,
    },
}

#[derive(Subcommand)]
enum Shape {
    /// A flat circle in the XZ plane.
    Circle {
        /// Center as x,y,z.
        #[arg(long, default_value = "0,0,0")]
        center: String,

        #[arg(short, long, default_value_t = 1.0)]
        radius: f32,

        /// Points around the ring.
        #[arg(short = 'n', long, default_value_t = 32)]
        points: u32,

        /// Include every vertex in the output.
        #[arg(long)]
        vertices: bool,
    },
    /// An open cylinder side wall.
    Cylinder {
        /// Center as x,y,z.
        #[arg(long, default_value = "0,0,0")]
        center: String,

        #[arg(short, long, default_value_t = 1.0)]
        radius: f32,

        #[arg(short = 'H', long, default_value_t = 1.0)]
        height: f32,

        /// Points around the ring.
        #[arg(short = 'n', long, default_value_t = 32)]
        points: u32,

        /// Include every vertex in the output.
        #[arg(long)]
        vertices: bool,
    },
}

fn tessellate(shape: Shape) -> Result<ShapeReport, CliError> {
    let report = match shape {
        Shape::Circle {
            center,
            radius,
            points,
            vertices,
        } => {
            let center = query::parse_point("--center", &center)?;
            let data = create_circle(&Circle::new(center, radius), points)?;
            ShapeReport::new("circle", &data, vertices)
        }
        Shape::Cylinder {
            center,
            radius,
            height,
            points,
            vertices,
        } => {
            let center = query::parse_point("--center", &center)?;
            let data = create_cylinder(&Cylinder::new(center, radius, height), points)?;
            ShapeReport::new("cylinder", &data, vertices)
        }
    };
    Ok(report)
}

fn pick_query(
    origin: Option<String>,
    direction: Option<String>,
    spheres: Vec<String>,
    plane: Option<String>,
    query_json: Option<String>,
) -> Result<PickQuery, CliError> {
    if let Some(json) = query_json {
        return PickQuery::from_json(&json);
    }

    let (Some(origin), Some(direction)) = (origin, direction) else {
        return Err(CliError::Input("--origin and --direction are required without --query".into()));
    };
    let ray = Ray::new(
        query::parse_point("--origin", &origin)?,
        query::parse_vector("--direction", &direction)?,
    )?;
    let spheres = spheres
        .iter()
        .map(|s| query::parse_sphere(s))
        .collect::<Result<Vec<_>, _>>()?;
    let plane = plane.as_deref().map(query::parse_plane).transpose()?;

    Ok(PickQuery { ray, spheres, plane })
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Tessellate { shape } => {
            let report = tessellate(shape)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{report}");
            }
        }
        Command::Pick {
            origin,
            direction,
            spheres,
            plane,
            query: query_json,
        } => {
            let report = pick_query(origin, direction, spheres, plane, query_json)?.evaluate();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{report}");
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(LoggingConfig::from_verbosity(cli.verbose));

    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        log::debug!("command failed: {e}");
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn tessellate_circle_worked_example() {
        let cli = Cli::try_parse_from(["ember", "tessellate", "circle", "-n", "4"]).unwrap();
        let Command::Tessellate { shape } = cli.command else {
            panic!("expected tessellate");
        };
        let report = tessellate(shape).unwrap();
        assert_eq!(report.vertex_count, 6);
        assert_eq!(report.draw_list[0].count, 6);
    }

    #[test]
    fn tessellate_zero_points_is_geometry_error() {
        let cli = Cli::try_parse_from(["ember", "tessellate", "cylinder", "-n", "0"]).unwrap();
        let Command::Tessellate { shape } = cli.command else {
            panic!("expected tessellate");
        };
        assert_eq!(tessellate(shape).unwrap_err().exit_code(), 10);
    }

    #[test]
    fn tessellate_non_finite_radius_is_geometry_error() {
        for args in [
            ["ember", "tessellate", "circle", "-r", "nan"],
            ["ember", "tessellate", "cylinder", "-H", "inf"],
        ] {
            let cli = Cli::try_parse_from(args).unwrap();
            let Command::Tessellate { shape } = cli.command else {
                panic!("expected tessellate");
            };
            assert_eq!(tessellate(shape).unwrap_err().exit_code(), 10, "{args:?}");
        }
    }

    #[test]
    fn tessellate_non_finite_center_is_input_error() {
        let cli =
            Cli::try_parse_from(["ember", "tessellate", "circle", "--center", "0,nan,0"]).unwrap();
        let Command::Tessellate { shape } = cli.command else {
            panic!("expected tessellate");
        };
        assert_eq!(tessellate(shape).unwrap_err().exit_code(), 12);
    }

    #[test]
    fn pick_from_flags() {
        let query = pick_query(
            Some("0,0,5".into()),
            Some("0,0,-1".into()),
            vec!["0,0,0,1".into(), "5,5,5,1".into()],
            Some("0,0,0,0,0,1".into()),
            None,
        )
        .unwrap();
        let report = query.evaluate();
        assert!(report.spheres[0].hit);
        assert!(!report.spheres[1].hit);
        assert!(report.plane.is_some());
    }

    #[test]
    fn pick_zero_direction_is_geometry_error() {
        let err = pick_query(Some("0,0,0".into()), Some("0,0,0".into()), Vec::new(), None, None)
            .unwrap_err();
        assert_eq!(err.exit_code(), 10);
    }

    #[test]
    fn pick_requires_origin_without_query() {
        assert!(Cli::try_parse_from(["ember", "pick", "--direction", "0,0,1"]).is_err());
    }

    #[test]
    fn pick_query_conflicts_with_flags() {
        assert!(Cli::try_parse_from(["ember", "pick", "--query", "{}", "--origin", "0,0,0"]).is_err());
    }
}
