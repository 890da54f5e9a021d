fn main() {
    snipq_cli::run_main();
}
