use nibble_cdf::Config;

pub fn handle(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", config.to_toml());
    Ok(())
}
