fn main() {
    dseectl::run_cli();
}
