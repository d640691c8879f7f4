fn main() -> anyhow::Result<()> {
    resticgen::cli::run()
}
