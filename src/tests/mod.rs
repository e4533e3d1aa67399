mod translate_route_tests;
