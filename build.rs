fn main() {
    uniffi::generate_scaffolding("src/diveplan.udl").unwrap();
}
