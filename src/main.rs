fn main() {
    easyssh::cli::run();
}
