use std::io::{self, Read};

use anyhow::Result;
use hc1dec::{Config, Decoded, ValueSetMapper};
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let config = Config::from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let mut data = String::new();
    let mut stdin = io::stdin();
    stdin.read_to_string(&mut data)?;

    match hc1dec::decode(&data, &config) {
        Ok(decoded) => {
            println!("{:#?}", decoded);
            print_summary(&config, &decoded);
            Ok(())
        }
        Err(partial) => {
            println!("{:#?}", partial.output);
            for line in &partial.output.diagnose_lines {
                println!("{}", line);
            }
            Err(partial.into())
        }
    }
}

fn print_summary(config: &Config, decoded: &Decoded) {
    let cert = match decoded.credential() {
        Some(cert) => cert,
        None => return,
    };

    let mapper = match ValueSetMapper::load(&config.value_set_path) {
        Ok(mapper) => mapper,
        Err(e) => {
            warn!(error = %e, "value sets unavailable, showing codes");
            ValueSetMapper::default()
        }
    };

    println!("Name: {}", cert.name.full_name());
    println!("DOB : {}", cert.date_of_birth);
    for vaccine in &cert.vaccinations {
        let display = |name: Option<&hc1dec::ValueSetValue>, code: &str| {
            name.map(|v| v.display.clone())
                .unwrap_or_else(|| code.to_string())
        };

        println!("  Doses Administered: {}", vaccine.dose_number());
        println!("  Doses Required:     {}", vaccine.total_doses());
        println!("  When:               {}", vaccine.date);
        println!(
            "  Vaccine Product:    {}",
            display(
                mapper.medicinal_product(&vaccine.medicinal_product),
                &vaccine.medicinal_product
            )
        );
        println!(
            "  Vaccine Type:       {}",
            display(mapper.vaccine_type(&vaccine.vaccine_type), &vaccine.vaccine_type)
        );
        println!(
            "  Vaccine Maker:      {}",
            display(
                mapper.marketing_auth_holder(&vaccine.marketing_auth_holder),
                &vaccine.marketing_auth_holder
            )
        );
        println!("  Issuer:             {}", vaccine.issuer);
        println!("  ID:                 {}", vaccine.certificate_id);
    }
}
