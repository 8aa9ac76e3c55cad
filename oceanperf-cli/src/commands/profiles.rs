//! Profiles command - list the quality profile catalog.

use console::style;
use oceanperf::quality::QualityProfileCatalog;

use crate::error::CliError;

/// Run the profiles command.
pub fn run(json: bool) -> Result<(), CliError> {
    let mut profiles = vec![QualityProfileCatalog::emergency()];
    profiles.extend(QualityProfileCatalog::all_profiles());
    profiles.push(QualityProfileCatalog::ultra());

    if json {
        let values: Vec<_> = profiles.iter().map(|p| p.as_ref()).collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
        return Ok(());
    }

    println!("Quality Profiles");
    println!("================");
    println!();
    println!(
        "  {:<10} {:>5} {:>4} {:>9}  {:<28} {:>6}",
        "name", "step", "fps", "intensity", "layers", "load"
    );

    for profile in &profiles {
        let mut layers = Vec::new();
        if profile.atmosphere {
            layers.push("atmosphere");
        }
        if profile.reflections {
            layers.push("reflections");
        }
        if profile.shimmer {
            layers.push("shimmer");
        }
        if profile.specular {
            layers.push("specular");
        }
        let layers = if layers.is_empty() {
            "-".to_string()
        } else {
            layers.join(",")
        };

        let name = if profile.is_on_ladder() {
            style(profile.name).bold()
        } else {
            style(profile.name).dim()
        };
        println!(
            "  {:<10} {:>5} {:>4} {:>9.2}  {:<28} {:>6.1}",
            name,
            profile.step_size,
            profile.target_fps,
            profile.effect_intensity,
            layers,
            profile.computational_load()
        );
    }

    println!();
    println!("Only bold profiles are reachable by automatic adjustment.");
    Ok(())
}
