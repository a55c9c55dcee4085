fn main() -> miette::Result<()> {
    testscope::cli::run()
}
