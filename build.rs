const PROTO_DIR: &str = "src/protos";
const PROTOS: [&str; 1] = ["src/protos/gltrace.proto"];

fn main() {
    protobuf_codegen::Codegen::new()
        .pure()
        .include(PROTO_DIR)
        .inputs(PROTOS)
        .cargo_out_dir("protos")
        .run_from_script();

    for proto in PROTOS {
        println!("cargo:rerun-if-changed={}", proto);
    }
}
