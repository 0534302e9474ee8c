use crate::cli::args::InitArgs;
use crate::exit_codes;
use crate::templates;
use std::path::Path;

pub fn run(args: InitArgs) -> anyhow::Result<i32> {
    println!("Scaffolding listening-test layout in {}", args.dir.display());

    for dir in ["app_input/audios", "app_input/audios/test", "app_output"] {
        let path = args.dir.join(dir);
        std::fs::create_dir_all(&path)
            .map_err(|e| anyhow::anyhow!("failed to create {}: {}", path.display(), e))?;
        println!("   Created {}/", path.display());
    }

    write_file_if_missing(
        &args.dir.join("app_input/csv/list.csv"),
        templates::SAMPLE_MANIFEST_CSV,
    )?;
    write_file_if_missing(
        &args.dir.join("audition.yaml"),
        templates::AUDITION_CONFIG_DEFAULT_YAML,
    )?;

    println!("Done. Drop clips under app_input/audios/<model>/ and run 'audition validate'.");
    Ok(exit_codes::OK)
}

fn write_file_if_missing(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if path.exists() {
        println!("   Skipped {} (exists)", path.display());
    } else {
        std::fs::write(path, content)
            .map_err(|e| anyhow::anyhow!("failed to write {}: {}", path.display(), e))?;
        println!("   Created {}", path.display());
    }
    Ok(())
}
