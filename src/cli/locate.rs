//! Define locate subcommand
use crate::config::Config;
use crate::geolocation::{FormFields, GeolocationFiller};
use log::{debug, info};
use std::path::PathBuf;
use structopt::StructOpt;

/// Fill the latitude, longitude and elevation fields of a form file with the current position
#[derive(Debug, StructOpt)]
pub struct LocateOpts {
    /// YAML file mapping form field ids to values, it is updated in place
    #[structopt(short, long, parse(from_os_str))]
    form: PathBuf,
    /// write the updated form here instead of back into the form file
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
}

pub fn locate_command(config: Config, opts: LocateOpts) -> Result<(), Box<dyn std::error::Error>> {
    let mut form = FormFields::load(&opts.form)?;
    let filler = GeolocationFiller::from_config(&config);

    let mut written = false;
    filler.request_fix(
        |fix| written = filler.write_fix(&fix, &mut form).is_some(),
        |e| debug!("Position request failed: {}", e),
        &filler.options(),
    );

    // a failed fix leaves the form exactly as it was
    if written {
        let dest = opts.output.as_ref().unwrap_or(&opts.form);
        form.save(dest)?;
        info!("Updated form saved to: {:?}", dest);
    } else {
        info!("No position written to: {:?}", opts.form);
    }
    Ok(())
}
